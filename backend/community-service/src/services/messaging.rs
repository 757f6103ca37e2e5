/// Direct messages between connected users
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::message_repo;
use crate::error::{AppError, Result};
use crate::models::Message;
use crate::repository::ConnectionRepository;
use crate::websocket::{LiveEvent, LivePush, SocketRegistry};

pub const MAX_MESSAGE_LEN: usize = 4000;

/// Trimmed message body, between 1 and `MAX_MESSAGE_LEN` characters.
fn validate_content(content: &str) -> Result<&str> {
    let content = content.trim();
    let len = content.chars().count();
    if len == 0 || len > MAX_MESSAGE_LEN {
        return Err(AppError::InvalidInput(format!(
            "message must be 1 to {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(content)
}

#[derive(Clone)]
pub struct MessagingService {
    db: PgPool,
    connections: Arc<dyn ConnectionRepository>,
    chat: SocketRegistry,
}

impl MessagingService {
    pub fn new(
        db: PgPool,
        connections: Arc<dyn ConnectionRepository>,
        chat: SocketRegistry,
    ) -> Self {
        Self {
            db,
            connections,
            chat,
        }
    }

    /// Store a message and relay it to the recipient's chat sockets.
    ///
    /// Fails with Forbidden unless the two users are connected.
    pub async fn send(&self, sender_id: Uuid, recipient_id: Uuid, content: &str) -> Result<Message> {
        let content = validate_content(content)?;
        if sender_id == recipient_id {
            return Err(AppError::InvalidInput("cannot message yourself".into()));
        }
        if !self.connections.are_connected(sender_id, recipient_id).await? {
            return Err(AppError::Forbidden(
                "messages can only be sent between connected users".into(),
            ));
        }

        let message = message_repo::insert_message(&self.db, sender_id, recipient_id, content).await?;
        debug!(message_id = %message.id, "direct message stored");

        if let Err(e) = self
            .chat
            .push(
                recipient_id,
                &LiveEvent::Message {
                    message: message.clone(),
                },
            )
            .await
        {
            warn!(message_id = %message.id, error = %e, "chat relay failed");
        }

        Ok(message)
    }

    /// Messages exchanged with `other_id`, newest first. Marks the ones
    /// received by `user_id` as read.
    pub async fn conversation(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>> {
        let messages = message_repo::conversation(&self.db, user_id, other_id, limit, offset).await?;
        message_repo::mark_read(&self.db, user_id, other_id).await?;
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_length_counts_characters() {
        let accented = "é".repeat(MAX_MESSAGE_LEN);
        assert_eq!(validate_content(&accented).unwrap(), accented);

        let too_long = "é".repeat(MAX_MESSAGE_LEN + 1);
        assert!(matches!(
            validate_content(&too_long),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_content_is_trimmed() {
        assert_eq!(validate_content("  hi \n").unwrap(), "hi");
        assert!(validate_content("   ").is_err());
    }
}
