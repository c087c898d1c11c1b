//! Set of connected dashboard clients

use crate::channel::{ChannelId, ClientChannel};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Active subscribers, keyed by channel identity
///
/// A single lock guards the whole set; it is never held while a message is
/// being delivered.
#[derive(Default)]
pub struct SubscriberSet {
    channels: Mutex<HashMap<ChannelId, Arc<dyn ClientChannel>>>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber; adding the same identity twice keeps one entry
    pub async fn add(&self, channel: Arc<dyn ClientChannel>) {
        let mut channels = self.channels.lock().await;
        channels.insert(channel.id(), channel);
    }

    /// Remove a subscriber (no-op when absent)
    pub async fn remove(&self, id: ChannelId) -> bool {
        let mut channels = self.channels.lock().await;
        channels.remove(&id).is_some()
    }

    /// Remove a batch of subscribers, returning how many were present
    pub async fn remove_many(&self, ids: &[ChannelId]) -> usize {
        let mut channels = self.channels.lock().await;
        ids.iter().filter(|id| channels.remove(id).is_some()).count()
    }

    pub async fn contains(&self, id: ChannelId) -> bool {
        self.channels.lock().await.contains_key(&id)
    }

    /// Current subscribers, for delivery outside the lock
    pub async fn snapshot(&self) -> Vec<Arc<dyn ClientChannel>> {
        let channels = self.channels.lock().await;
        channels.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.lock().await.is_empty()
    }
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MpscChannel;

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let set = SubscriberSet::new();
        let (channel, _rx) = MpscChannel::pair(1);

        set.add(channel.clone()).await;
        set.add(channel.clone()).await;

        assert_eq!(set.len().await, 1);
        assert!(set.contains(channel.id()).await);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let set = SubscriberSet::new();
        let (channel, _rx) = MpscChannel::pair(1);
        set.add(channel.clone()).await;

        assert!(set.remove(channel.id()).await);
        assert!(!set.remove(channel.id()).await);
        assert!(set.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_many_ignores_unknown_ids() {
        let set = SubscriberSet::new();
        let (a, _rx_a) = MpscChannel::pair(1);
        let (b, _rx_b) = MpscChannel::pair(1);
        set.add(a.clone()).await;
        set.add(b.clone()).await;

        let removed = set.remove_many(&[a.id(), ChannelId::new()]).await;

        assert_eq!(removed, 1);
        assert_eq!(set.len().await, 1);
        assert!(set.contains(b.id()).await);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let set = SubscriberSet::new();
        let (a, _rx_a) = MpscChannel::pair(1);
        set.add(a.clone()).await;

        let snapshot = set.snapshot().await;
        set.remove(a.id()).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), a.id());
    }
}
