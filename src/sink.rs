//! Observability sink for engine events
//!
//! Health transitions are per-agent activity entries and go to the
//! `agent_activity` target, which the logging setup routes to its own file.
//! Everything else is a general log line.

use crate::channel::ChannelId;
use crate::events::HealthTransition;
use crate::metrics::MetricsSnapshot;
use tracing::{info, warn};

/// Tracing target for per-agent activity entries
pub const ACTIVITY_TARGET: &str = "agent_activity";

/// Receiver of events produced by the periodic tasks
pub trait EventSink: Send + Sync {
    /// An agent's health changed
    fn health_transition(&self, transition: &HealthTransition);

    /// A metrics cycle completed
    fn metrics(&self, snapshot: &MetricsSnapshot);

    /// A subscriber was dropped after a failed delivery
    fn subscriber_pruned(&self, channel_id: ChannelId, reason: &str);
}

/// Sink that writes everything through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn health_transition(&self, transition: &HealthTransition) {
        let old = transition
            .old_status
            .map(|s| s.as_str())
            .unwrap_or("none");
        info!(
            target: ACTIVITY_TARGET,
            agent_id = %transition.agent_id,
            old_status = old,
            new_status = %transition.new_status,
            "Agent {} health status changed: {}",
            transition.agent_id,
            transition.new_status
        );
    }

    fn metrics(&self, snapshot: &MetricsSnapshot) {
        info!(
            agent_count = snapshot.agent_count,
            subscriber_count = snapshot.subscriber_count,
            healthy = snapshot.health.healthy,
            degraded = snapshot.health.degraded,
            unhealthy = snapshot.health.unhealthy,
            unknown = snapshot.health.unknown,
            "Performance metrics collected"
        );
    }

    fn subscriber_pruned(&self, channel_id: ChannelId, reason: &str) {
        warn!(channel_id = %channel_id, reason, "Dropping dashboard subscriber");
    }
}
