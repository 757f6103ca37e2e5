//! Cross-instance live push over Redis pub/sub.
//!
//! Every instance publishes notification frames on `notify:{user_id}` and runs
//! one pattern listener that hands incoming frames to its local registry. A
//! user connected to any instance therefore receives pushes dispatched on any
//! other instance.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{LiveEvent, LivePush, SocketRegistry};
use crate::error::{AppError, Result};

const CHANNEL_PREFIX: &str = "notify:";

fn channel_for_user(user_id: Uuid) -> String {
    format!("{CHANNEL_PREFIX}{user_id}")
}

fn user_from_channel(channel: &str) -> Option<Uuid> {
    channel
        .strip_prefix(CHANNEL_PREFIX)
        .and_then(|id| Uuid::parse_str(id).ok())
}

#[derive(Clone)]
pub struct RedisFanout {
    conn: ConnectionManager,
}

impl RedisFanout {
    pub async fn connect(client: &redis::Client) -> Result<Self> {
        let conn = ConnectionManager::new(client.clone()).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl LivePush for RedisFanout {
    async fn push(&self, user_id: Uuid, event: &LiveEvent) -> Result<()> {
        let frame = event
            .to_json()
            .map_err(|e| AppError::Internal(format!("encode live event: {e}")))?;
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel_for_user(user_id), frame)
            .await?;
        Ok(())
    }
}

/// Subscribe to every user channel and deliver frames to `registry`.
///
/// The listener reconnects after a pause when the subscription drops.
pub fn spawn_listener(client: redis::Client, registry: SocketRegistry) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = listen(&client, &registry).await {
                tracing::error!(error = %e, "notification fan-out listener failed");
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    })
}

async fn listen(client: &redis::Client, registry: &SocketRegistry) -> redis::RedisResult<()> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.psubscribe(format!("{CHANNEL_PREFIX}*")).await?;
    tracing::info!("notification fan-out listener subscribed");

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let Some(user_id) = user_from_channel(msg.get_channel_name()) else {
            continue;
        };
        let frame: String = msg.get_payload()?;
        let delivered = registry.send(user_id, &frame).await;
        crate::metrics::record_live_push(delivered > 0);
    }

    Ok(())
}
