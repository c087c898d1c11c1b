//! Client channel abstraction
//!
//! One connected dashboard subscriber: something a message can be pushed to,
//! which may fail. The WebSocket front-end and the tests both use the
//! mpsc-backed [`MpscChannel`].

use crate::events::DashboardMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identity of a subscriber; the subscriber set is keyed by it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell connections apart in logs
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,

    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    #[error("send rejected: {0}")]
    Rejected(String),
}

/// A connected subscriber
#[async_trait]
pub trait ClientChannel: Send + Sync {
    fn id(&self) -> ChannelId;

    /// Push one message to the client
    async fn send(&self, message: Arc<DashboardMessage>) -> Result<(), ChannelError>;

    /// True once the client side has gone away
    fn is_closed(&self) -> bool;

    /// Called after the channel was dropped from the subscriber set, so the
    /// owner of the connection can shut it down
    fn close(&self) {}
}

/// Channel backed by a bounded tokio mpsc queue
///
/// The receiving half is drained by whoever owns the real connection, which
/// should also watch [`MpscChannel::closed`] and hang up once it resolves.
#[derive(Debug, Clone)]
pub struct MpscChannel {
    id: ChannelId,
    tx: mpsc::Sender<Arc<DashboardMessage>>,
    shutdown: CancellationToken,
}

impl MpscChannel {
    /// Create a channel and the receiver that feeds the client
    pub fn pair(buffer: usize) -> (Arc<Self>, mpsc::Receiver<Arc<DashboardMessage>>) {
        let (tx, rx) = mpsc::channel(buffer);
        let channel = Arc::new(Self {
            id: ChannelId::new(),
            tx,
            shutdown: CancellationToken::new(),
        });
        (channel, rx)
    }

    /// Resolves once the channel has been closed
    pub async fn closed(&self) {
        self.shutdown.cancelled().await
    }
}

#[async_trait]
impl ClientChannel for MpscChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    async fn send(&self, message: Arc<DashboardMessage>) -> Result<(), ChannelError> {
        if self.shutdown.is_cancelled() {
            return Err(ChannelError::Closed);
        }
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(ChannelError::Closed),
            result = self.tx.send(message) => result.map_err(|_| ChannelError::Closed),
        }
    }

    fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled() || self.tx.is_closed()
    }

    fn close(&self) {
        self.shutdown.cancel();
    }
}
