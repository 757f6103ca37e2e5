/// Frames exchanged over the notification and chat sockets
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, Notification};

/// Server to client frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LiveEvent {
    /// A stored notification pushed to its owner
    #[serde(rename_all = "camelCase")]
    Notification {
        sender_id: Uuid,
        notification: Notification,
    },

    /// The sender withdrew a pending connection request
    #[serde(rename_all = "camelCase")]
    ConnectionCancelled { sender_id: Uuid, recipient_id: Uuid },

    /// A direct message relayed to its recipient
    Message { message: Message },

    /// Confirms to the author that a direct message was stored
    Sent { message: Message },

    Error { code: String, message: String },
}

impl LiveEvent {
    pub fn notification(notification: Notification) -> Self {
        LiveEvent::Notification {
            sender_id: notification.sender_id,
            notification,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        LiveEvent::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Client to server frames on the chat socket
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatInbound {
    #[serde(rename_all = "camelCase")]
    Send { recipient_id: Uuid, content: String },
}
