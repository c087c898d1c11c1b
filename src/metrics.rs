//! Aggregate counters reported by the metrics collector

use crate::registry::{AgentRecord, HealthStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agent counts per last observed health status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCounts {
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
    pub unknown: usize,
    /// Registered but not probed yet
    pub unchecked: usize,
}

impl HealthCounts {
    pub fn tally<'a>(agents: impl IntoIterator<Item = &'a AgentRecord>) -> Self {
        let mut counts = Self::default();
        for agent in agents {
            match agent.last_health {
                Some(HealthStatus::Healthy) => counts.healthy += 1,
                Some(HealthStatus::Degraded) => counts.degraded += 1,
                Some(HealthStatus::Unhealthy) => counts.unhealthy += 1,
                Some(HealthStatus::Unknown) => counts.unknown += 1,
                None => counts.unchecked += 1,
            }
        }
        counts
    }
}

/// Point-in-time metrics; produced fresh, never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub agent_count: usize,
    pub subscriber_count: usize,
    pub health: HealthCounts,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentRegistry;

    #[tokio::test]
    async fn test_health_tally() {
        let registry = AgentRegistry::new();
        for id in ["a", "b", "c", "d"] {
            registry.upsert(id, Default::default()).await;
        }
        registry.set_health("a", HealthStatus::Healthy).await;
        registry.set_health("b", HealthStatus::Healthy).await;
        registry.set_health("c", HealthStatus::Unknown).await;

        let snapshot = registry.snapshot().await;
        let counts = HealthCounts::tally(snapshot.values());

        assert_eq!(
            counts,
            HealthCounts {
                healthy: 2,
                degraded: 0,
                unhealthy: 0,
                unknown: 1,
                unchecked: 1,
            }
        );
    }
}
