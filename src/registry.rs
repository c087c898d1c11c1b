//! Agent registry
//!
//! Canonical in-memory map of tracked agents. Shared by the front-end and all
//! periodic tasks; every operation takes the lock for a single step and
//! readers get an owned copy, so no caller holds the lock across I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// Opaque agent state supplied by the front-end
pub type AgentPayload = serde_json::Map<String, serde_json::Value>;

/// Last observed health of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    /// Probe failed or timed out
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRecord {
    /// Agent ID
    pub id: String,
    /// State reported by the agent's owner
    #[serde(default)]
    pub payload: AgentPayload,
    /// None until the health monitor has checked the agent once
    pub last_health: Option<HealthStatus>,
    /// First registration
    pub registered_at: DateTime<Utc>,
    /// Last upsert or health change
    pub updated_at: DateTime<Utc>,
}

impl AgentRecord {
    fn new(id: String, payload: AgentPayload) -> Self {
        let now = Utc::now();
        Self {
            id,
            payload,
            last_health: None,
            registered_at: now,
            updated_at: now,
        }
    }
}

/// Registry of tracked agents
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, AgentRecord>>,
}

impl AgentRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent or replace its payload
    ///
    /// The recorded health status and registration time survive the update.
    pub async fn upsert(&self, id: impl Into<String>, payload: AgentPayload) {
        let id = id.into();
        let mut agents = self.agents.write().await;
        match agents.get_mut(&id) {
            Some(record) => {
                record.payload = payload;
                record.updated_at = Utc::now();
            }
            None => {
                agents.insert(id.clone(), AgentRecord::new(id, payload));
            }
        }
    }

    /// Remove agent (no-op when absent)
    pub async fn remove(&self, id: &str) -> Option<AgentRecord> {
        let mut agents = self.agents.write().await;
        agents.remove(id)
    }

    /// Record a health status
    ///
    /// Returns false, changing nothing, when the agent is not registered.
    pub async fn set_health(&self, id: &str, status: HealthStatus) -> bool {
        let mut agents = self.agents.write().await;
        match agents.get_mut(id) {
            Some(record) => {
                record.last_health = Some(status);
                record.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Get agent by ID
    pub async fn get(&self, id: &str) -> Option<AgentRecord> {
        let agents = self.agents.read().await;
        agents.get(id).cloned()
    }

    /// Point-in-time copy of all agents
    pub async fn snapshot(&self) -> HashMap<String, AgentRecord> {
        let agents = self.agents.read().await;
        agents.clone()
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> AgentPayload {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_last_upsert_wins() {
        let registry = AgentRegistry::new();

        registry.upsert("planner", payload(json!({"task": "a"}))).await;
        registry.upsert("planner", payload(json!({"task": "b"}))).await;
        registry.upsert("planner", payload(json!({"task": "c", "step": 3}))).await;

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["planner"].payload, payload(json!({"task": "c", "step": 3})));
    }

    #[tokio::test]
    async fn test_upsert_preserves_health() {
        let registry = AgentRegistry::new();

        registry.upsert("executor", AgentPayload::new()).await;
        assert!(registry.set_health("executor", HealthStatus::Degraded).await);

        registry.upsert("executor", payload(json!({"load": 0.9}))).await;

        let record = registry.get("executor").await.unwrap();
        assert_eq!(record.last_health, Some(HealthStatus::Degraded));
        assert_eq!(record.payload["load"], json!(0.9));
        assert!(record.updated_at >= record.registered_at);
    }

    #[tokio::test]
    async fn test_new_agent_is_unchecked() {
        let registry = AgentRegistry::new();
        registry.upsert("reviewer", AgentPayload::new()).await;

        assert_eq!(registry.get("reviewer").await.unwrap().last_health, None);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = AgentRegistry::new();
        assert!(registry.remove("ghost").await.is_none());

        registry.upsert("ghost", AgentPayload::new()).await;
        assert!(registry.remove("ghost").await.is_some());
        assert!(registry.remove("ghost").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_health_on_missing_agent() {
        let registry = AgentRegistry::new();

        assert!(!registry.set_health("missing", HealthStatus::Healthy).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let registry = AgentRegistry::new();
        registry.upsert("a", AgentPayload::new()).await;

        let snapshot = registry.snapshot().await;
        registry.remove("a").await;
        registry.upsert("b", AgentPayload::new()).await;

        assert!(snapshot.contains_key("a"));
        assert!(!snapshot.contains_key("b"));
        assert_eq!(registry.len().await, 1);
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
        assert_eq!(HealthStatus::Degraded.to_string(), "degraded");
    }
}
