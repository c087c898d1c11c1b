//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use solar_dash_core::{
    AgentPayload, ChannelError, ChannelId, ClientChannel, DashboardMessage, EventSink,
    HealthTransition, MetricsSnapshot,
};
use std::sync::{Arc, Mutex};

/// Sink that keeps everything it is given
#[derive(Default)]
pub struct RecordingSink {
    pub transitions: Mutex<Vec<HealthTransition>>,
    pub metrics: Mutex<Vec<MetricsSnapshot>>,
    pub pruned: Mutex<Vec<ChannelId>>,
}

impl EventSink for RecordingSink {
    fn health_transition(&self, transition: &HealthTransition) {
        self.transitions.lock().unwrap().push(transition.clone());
    }

    fn metrics(&self, snapshot: &MetricsSnapshot) {
        self.metrics.lock().unwrap().push(snapshot.clone());
    }

    fn subscriber_pruned(&self, channel_id: ChannelId, _reason: &str) {
        self.pruned.lock().unwrap().push(channel_id);
    }
}

/// Channel whose every send fails, like a client that went away mid-write
pub struct RejectingChannel {
    pub id: ChannelId,
}

impl RejectingChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { id: ChannelId::new() })
    }
}

#[async_trait]
impl ClientChannel for RejectingChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    async fn send(&self, _message: Arc<DashboardMessage>) -> Result<(), ChannelError> {
        Err(ChannelError::Rejected("connection reset by peer".to_string()))
    }

    fn is_closed(&self) -> bool {
        false
    }
}

/// Payload with a single `role` field
pub fn payload(role: &str) -> AgentPayload {
    let mut payload = AgentPayload::new();
    payload.insert("role".to_string(), serde_json::json!(role));
    payload
}
