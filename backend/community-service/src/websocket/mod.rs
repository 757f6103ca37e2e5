//! Live delivery over WebSockets
//!
//! - `registry`: per-user socket map inside one process
//! - `fanout`: Redis pub/sub relay between instances
//! - `notification_socket` / `chat_socket`: the actix actors behind `/ws/*`

pub mod chat_socket;
pub mod fanout;
pub mod messages;
pub mod notification_socket;
pub mod registry;
pub mod session;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

pub use chat_socket::chat_ws;
pub use fanout::RedisFanout;
pub use messages::{ChatInbound, LiveEvent};
pub use notification_socket::notifications_ws;
pub use registry::{SocketRegistry, SubscriberId};

/// Best-effort delivery of a frame to whatever sockets a user has open.
///
/// Implementations must treat an offline user as success.
#[async_trait]
pub trait LivePush: Send + Sync {
    async fn push(&self, user_id: Uuid, event: &LiveEvent) -> Result<()>;
}
