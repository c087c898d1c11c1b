//! Health monitor task
//!
//! Probes every registered agent and records status changes. Probes run
//! against a registry snapshot, so no lock is held while an agent is being
//! checked.

use super::{panic_message, PeriodicTask};
use crate::config::TaskSchedule;
use crate::error::TaskError;
use crate::events::HealthTransition;
use crate::probe::HealthProbe;
use crate::registry::{AgentRegistry, HealthStatus};
use crate::sink::EventSink;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HealthMonitor {
    registry: Arc<AgentRegistry>,
    probe: Arc<dyn HealthProbe>,
    sink: Arc<dyn EventSink>,
    schedule: TaskSchedule,
    probe_timeout: Duration,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<AgentRegistry>,
        probe: Arc<dyn HealthProbe>,
        sink: Arc<dyn EventSink>,
        schedule: TaskSchedule,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            probe,
            sink,
            schedule,
            probe_timeout,
        }
    }

    /// Probe one agent; failures, timeouts and panics count as unknown
    ///
    /// The probe runs in its own task so a panicking probe only affects the
    /// agent it was checking.
    pub async fn check_agent(&self, agent_id: &str) -> HealthStatus {
        let probe = self.probe.clone();
        let probe_timeout = self.probe_timeout;
        let id = agent_id.to_string();
        let outcome =
            tokio::spawn(async move { tokio::time::timeout(probe_timeout, probe.probe(&id)).await })
                .await;

        match outcome {
            Ok(Ok(Ok(status))) => status,
            Ok(Ok(Err(e))) => {
                warn!(agent_id, error = %e, "Health probe failed");
                HealthStatus::Unknown
            }
            Ok(Err(_)) => {
                warn!(
                    agent_id,
                    timeout_ms = probe_timeout.as_millis() as u64,
                    "Health probe timed out"
                );
                HealthStatus::Unknown
            }
            Err(e) => {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                warn!(agent_id, reason = %reason, "Health probe panicked");
                HealthStatus::Unknown
            }
        }
    }

    /// Probe all agents once, returning the transitions that were recorded
    pub async fn check_all(&self) -> Vec<HealthTransition> {
        let agents = self.registry.snapshot().await;
        let mut transitions = Vec::new();

        for (agent_id, record) in agents {
            let status = self.check_agent(&agent_id).await;
            if record.last_health == Some(status) {
                continue;
            }

            // Agent may have been removed while it was being probed
            if !self.registry.set_health(&agent_id, status).await {
                debug!(agent_id = %agent_id, "Agent removed during health check");
                continue;
            }

            let transition = HealthTransition::new(agent_id, record.last_health, status);
            self.sink.health_transition(&transition);
            transitions.push(transition);
        }

        transitions
    }
}

#[async_trait]
impl PeriodicTask for HealthMonitor {
    fn name(&self) -> &'static str {
        "health_monitor"
    }

    fn schedule(&self) -> TaskSchedule {
        self.schedule
    }

    async fn run_cycle(&self) -> Result<(), TaskError> {
        let transitions = self.check_all().await;
        debug!(transitions = transitions.len(), "Health check cycle complete");
        Ok(())
    }
}
