//! Broadcast task
//!
//! Pushes the full agent state to every subscriber. Deliveries run
//! concurrently, each bounded by the send timeout; subscribers whose delivery
//! fails are closed and removed only after the whole pass has finished.

use super::PeriodicTask;
use crate::channel::{ChannelError, ChannelId};
use crate::config::TaskSchedule;
use crate::error::TaskError;
use crate::events::DashboardMessage;
use crate::registry::AgentRegistry;
use crate::sink::EventSink;
use crate::subscribers::SubscriberSet;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Outcome of one broadcast pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub pruned: Vec<ChannelId>,
}

pub struct Broadcaster {
    registry: Arc<AgentRegistry>,
    subscribers: Arc<SubscriberSet>,
    sink: Arc<dyn EventSink>,
    schedule: TaskSchedule,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<AgentRegistry>,
        subscribers: Arc<SubscriberSet>,
        sink: Arc<dyn EventSink>,
        schedule: TaskSchedule,
        send_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            subscribers,
            sink,
            schedule,
            send_timeout,
        }
    }

    /// Deliver the current state to all subscribers once
    pub async fn broadcast_once(&self) -> BroadcastReport {
        let channels = self.subscribers.snapshot().await;
        if channels.is_empty() {
            return BroadcastReport::default();
        }

        let agents = self.registry.snapshot().await;
        let message = Arc::new(DashboardMessage::dashboard_update(agents));

        let mut deliveries = Vec::with_capacity(channels.len());
        for channel in channels {
            if channel.is_closed() {
                deliveries.push((channel, None));
                continue;
            }

            let target = channel.clone();
            let message = message.clone();
            let send_timeout = self.send_timeout;
            let handle = tokio::spawn(async move {
                match tokio::time::timeout(send_timeout, target.send(message)).await {
                    Ok(result) => result,
                    Err(_) => Err(ChannelError::Timeout(send_timeout)),
                }
            });
            deliveries.push((channel, Some(handle)));
        }

        let mut report = BroadcastReport::default();
        for (channel, delivery) in deliveries {
            let id = channel.id();
            let outcome = match delivery {
                None => Err(ChannelError::Closed.to_string()),
                Some(handle) => match handle.await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(e) => Err(format!("delivery task failed: {}", e)),
                },
            };

            match outcome {
                Ok(()) => report.delivered += 1,
                Err(reason) => {
                    channel.close();
                    self.sink.subscriber_pruned(id, &reason);
                    report.pruned.push(id);
                }
            }
        }

        if !report.pruned.is_empty() {
            self.subscribers.remove_many(&report.pruned).await;
        }

        report
    }
}

#[async_trait]
impl PeriodicTask for Broadcaster {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    fn schedule(&self) -> TaskSchedule {
        self.schedule
    }

    async fn run_cycle(&self) -> Result<(), TaskError> {
        let report = self.broadcast_once().await;
        if report.delivered == 0 && !report.pruned.is_empty() {
            return Err(TaskError::Cycle {
                task: "broadcast",
                message: format!("all {} deliveries failed", report.pruned.len()),
            });
        }
        if report.delivered > 0 {
            debug!(
                delivered = report.delivered,
                pruned = report.pruned.len(),
                "Broadcast cycle complete"
            );
        }
        Ok(())
    }
}
