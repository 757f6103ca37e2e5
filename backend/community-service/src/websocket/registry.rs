use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

use super::{LiveEvent, LivePush};
use crate::error::{AppError, Result};
use crate::metrics;

/// Identifies one socket so it can be removed without touching the user's other sockets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<String>,
}

/// In-process map of user id to the open sockets of that user.
///
/// A user may hold several sockets (tabs, devices); each gets every frame.
/// Senders whose socket has gone away are dropped on the next send.
#[derive(Default, Clone)]
pub struct SocketRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Vec<Subscriber>>>>,
}

impl SocketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a socket for `user_id`; frames arrive on the returned receiver.
    pub async fn subscribe(&self, user_id: Uuid) -> (SubscriberId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let id = SubscriberId::new();

        let mut guard = self.inner.write().await;
        guard
            .entry(user_id)
            .or_default()
            .push(Subscriber { id, sender: tx });

        tracing::debug!(user_id = %user_id, subscriber = ?id, "socket registered");
        (id, rx)
    }

    pub async fn unsubscribe(&self, user_id: Uuid, subscriber_id: SubscriberId) {
        let mut guard = self.inner.write().await;

        if let Some(subscribers) = guard.get_mut(&user_id) {
            subscribers.retain(|s| s.id != subscriber_id);
            if subscribers.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    /// Send a raw frame to every socket of `user_id`. Returns how many sockets took it.
    pub async fn send(&self, user_id: Uuid, frame: &str) -> usize {
        let mut guard = self.inner.write().await;
        let Some(subscribers) = guard.get_mut(&user_id) else {
            return 0;
        };

        subscribers.retain(|s| s.sender.send(frame.to_string()).is_ok());
        let delivered = subscribers.len();
        if subscribers.is_empty() {
            guard.remove(&user_id);
        }
        delivered
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.inner.read().await.contains_key(&user_id)
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        let guard = self.inner.read().await;
        guard.get(&user_id).map(|v| v.len()).unwrap_or(0)
    }

    pub async fn total_connections(&self) -> usize {
        let guard = self.inner.read().await;
        guard.values().map(|v| v.len()).sum()
    }
}

#[async_trait]
impl LivePush for SocketRegistry {
    async fn push(&self, user_id: Uuid, event: &LiveEvent) -> Result<()> {
        let frame = event
            .to_json()
            .map_err(|e| AppError::Internal(format!("encode live event: {e}")))?;
        let delivered = self.send(user_id, &frame).await;
        metrics::record_live_push(delivered > 0);
        Ok(())
    }
}
