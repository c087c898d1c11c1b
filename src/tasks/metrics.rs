//! Metrics collector task

use super::PeriodicTask;
use crate::config::TaskSchedule;
use crate::error::TaskError;
use crate::metrics::{HealthCounts, MetricsSnapshot};
use crate::registry::AgentRegistry;
use crate::sink::EventSink;
use crate::subscribers::SubscriberSet;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Compute a fresh snapshot from the shared state
pub async fn collect_metrics(
    registry: &AgentRegistry,
    subscribers: &SubscriberSet,
) -> MetricsSnapshot {
    let agents = registry.snapshot().await;
    MetricsSnapshot {
        agent_count: agents.len(),
        subscriber_count: subscribers.len().await,
        health: HealthCounts::tally(agents.values()),
        timestamp: Utc::now(),
    }
}

pub struct MetricsCollector {
    registry: Arc<AgentRegistry>,
    subscribers: Arc<SubscriberSet>,
    sink: Arc<dyn EventSink>,
    schedule: TaskSchedule,
}

impl MetricsCollector {
    pub fn new(
        registry: Arc<AgentRegistry>,
        subscribers: Arc<SubscriberSet>,
        sink: Arc<dyn EventSink>,
        schedule: TaskSchedule,
    ) -> Self {
        Self {
            registry,
            subscribers,
            sink,
            schedule,
        }
    }

    /// Collect and report one snapshot
    pub async fn collect(&self) -> MetricsSnapshot {
        let snapshot = collect_metrics(&self.registry, &self.subscribers).await;
        self.sink.metrics(&snapshot);
        snapshot
    }
}

#[async_trait]
impl PeriodicTask for MetricsCollector {
    fn name(&self) -> &'static str {
        "metrics_collector"
    }

    fn schedule(&self) -> TaskSchedule {
        self.schedule
    }

    async fn run_cycle(&self) -> Result<(), TaskError> {
        self.collect().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MpscChannel;
    use crate::registry::AgentPayload;
    use crate::sink::testing::RecordingSink;

    #[tokio::test]
    async fn test_counts_agents_and_subscribers() {
        let registry = Arc::new(AgentRegistry::new());
        let subscribers = Arc::new(SubscriberSet::new());
        let sink = Arc::new(RecordingSink::default());

        for id in ["planner", "executor", "reviewer"] {
            registry.upsert(id, AgentPayload::new()).await;
        }
        let (a, _rx_a) = MpscChannel::pair(1);
        let (b, _rx_b) = MpscChannel::pair(1);
        subscribers.add(a).await;
        subscribers.add(b).await;

        let collector = MetricsCollector::new(
            registry,
            subscribers,
            sink.clone(),
            TaskSchedule::metrics_default(),
        );
        collector.run_cycle().await.unwrap();

        let reported = sink.metrics_seen();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].agent_count, 3);
        assert_eq!(reported[0].subscriber_count, 2);
        assert_eq!(reported[0].health.unchecked, 3);
    }

    #[tokio::test]
    async fn test_each_cycle_is_fresh() {
        let registry = Arc::new(AgentRegistry::new());
        let subscribers = Arc::new(SubscriberSet::new());
        let sink = Arc::new(RecordingSink::default());
        let collector = MetricsCollector::new(
            registry.clone(),
            subscribers,
            sink.clone(),
            TaskSchedule::metrics_default(),
        );

        let first = collector.collect().await;
        registry.upsert("late", AgentPayload::new()).await;
        let second = collector.collect().await;

        assert_eq!(first.agent_count, 0);
        assert_eq!(second.agent_count, 1);
        assert!(second.timestamp >= first.timestamp);
    }
}
