//! Live-state engine
//!
//! Owns the agent registry and subscriber set, exposes the operations the
//! front-end calls, and starts the three periodic tasks.

use crate::channel::{ChannelId, ClientChannel};
use crate::config::DashConfig;
use crate::error::{DashError, Result};
use crate::events::DashboardMessage;
use crate::metrics::MetricsSnapshot;
use crate::probe::{HealthProbe, StaticProbe};
use crate::registry::{AgentPayload, AgentRecord, AgentRegistry};
use crate::sink::{EventSink, TracingSink};
use crate::subscribers::SubscriberSet;
use crate::tasks::metrics::collect_metrics;
use crate::tasks::{
    run_periodic, Broadcaster, HealthMonitor, MetricsCollector, PeriodicTask, RunSummary,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Engine state shared with the front-end
pub struct Engine {
    config: DashConfig,
    registry: Arc<AgentRegistry>,
    subscribers: Arc<SubscriberSet>,
    probe: Arc<dyn HealthProbe>,
    sink: Arc<dyn EventSink>,
    running: Arc<AtomicBool>,
}

impl Engine {
    /// Create engine with the static probe and tracing sink
    pub fn new(config: DashConfig) -> Self {
        Self {
            config,
            registry: Arc::new(AgentRegistry::new()),
            subscribers: Arc::new(SubscriberSet::new()),
            probe: Arc::new(StaticProbe::default()),
            sink: Arc::new(TracingSink),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the health probe
    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replace the event sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &DashConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn subscribers(&self) -> &Arc<SubscriberSet> {
        &self.subscribers
    }

    /// Register an agent or replace its payload
    pub async fn register_or_update_agent(&self, id: impl Into<String>, payload: AgentPayload) {
        let id = id.into();
        debug!(agent_id = %id, "Registering agent");
        self.registry.upsert(id, payload).await;
    }

    /// Remove an agent; returns whether it was registered
    pub async fn remove_agent(&self, id: &str) -> bool {
        let removed = self.registry.remove(id).await.is_some();
        if removed {
            debug!(agent_id = id, "Removed agent");
        }
        removed
    }

    pub async fn add_subscriber(&self, channel: Arc<dyn ClientChannel>) {
        let id = channel.id();
        self.subscribers.add(channel).await;
        info!(channel_id = %id, "Dashboard client connected");
    }

    pub async fn remove_subscriber(&self, id: ChannelId) {
        if self.subscribers.remove(id).await {
            info!(channel_id = %id, "Dashboard client disconnected");
        }
    }

    /// Fresh metrics computed from current state
    pub async fn get_metrics_snapshot(&self) -> MetricsSnapshot {
        collect_metrics(&self.registry, &self.subscribers).await
    }

    /// Current registry contents
    pub async fn agents(&self) -> HashMap<String, AgentRecord> {
        self.registry.snapshot().await
    }

    /// Update message for the current state, outside the broadcast schedule
    pub async fn dashboard_update(&self) -> DashboardMessage {
        DashboardMessage::dashboard_update(self.registry.snapshot().await)
    }

    fn periodic_tasks(&self) -> Vec<Arc<dyn PeriodicTask>> {
        vec![
            Arc::new(HealthMonitor::new(
                self.registry.clone(),
                self.probe.clone(),
                self.sink.clone(),
                self.config.health,
                self.config.probe.timeout,
            )),
            Arc::new(MetricsCollector::new(
                self.registry.clone(),
                self.subscribers.clone(),
                self.sink.clone(),
                self.config.metrics,
            )),
            Arc::new(Broadcaster::new(
                self.registry.clone(),
                self.subscribers.clone(),
                self.sink.clone(),
                self.config.broadcast.schedule(),
                self.config.broadcast.send_timeout,
            )),
        ]
    }

    /// Start the health monitor, metrics collector and broadcast tasks
    ///
    /// Each runs as its own tokio task; a failing cycle in one never affects
    /// the others.
    pub fn start(&self) -> Result<EngineHandle> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(DashError::AlreadyRunning);
        }

        info!("Starting AI Agent Dashboard monitoring services");

        let cancel = CancellationToken::new();
        let tasks = self
            .periodic_tasks()
            .into_iter()
            .map(|task| {
                let name = task.name();
                let handle = tokio::spawn(run_periodic(task, cancel.child_token()));
                (name, handle)
            })
            .collect();

        Ok(EngineHandle {
            cancel,
            tasks,
            running: self.running.clone(),
        })
    }
}

/// Handle for the running periodic tasks
///
/// Dropping the handle cancels the tasks without waiting for them.
pub struct EngineHandle {
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<RunSummary>)>,
    running: Arc<AtomicBool>,
}

impl EngineHandle {
    /// Token that stops every task when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// True while every task is still alive
    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|(_, h)| !h.is_finished())
    }

    /// Stop all tasks and wait for them to finish
    pub async fn stop(mut self) -> Result<Vec<(&'static str, RunSummary)>> {
        self.cancel.cancel();

        let mut summaries = Vec::with_capacity(self.tasks.len());
        for (name, handle) in std::mem::take(&mut self.tasks) {
            let summary = handle.await.map_err(|e| DashError::TaskJoin {
                task: name.to_string(),
                message: e.to_string(),
            })?;
            summaries.push((name, summary));
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Monitoring services stopped");
        Ok(summaries)
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.running.store(false, Ordering::SeqCst);
    }
}
