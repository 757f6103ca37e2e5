use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A comment is attached to exactly one group or one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Group(Uuid),
    Event(Uuid),
}

impl CommentTarget {
    /// Build a target from the two optional ids; exactly one must be set.
    pub fn from_ids(group_id: Option<Uuid>, event_id: Option<Uuid>) -> Option<Self> {
        match (group_id, event_id) {
            (Some(g), None) => Some(CommentTarget::Group(g)),
            (None, Some(e)) => Some(CommentTarget::Event(e)),
            _ => None,
        }
    }

    pub fn group_id(self) -> Option<Uuid> {
        match self {
            CommentTarget::Group(id) => Some(id),
            CommentTarget::Event(_) => None,
        }
    }

    pub fn event_id(self) -> Option<Uuid> {
        match self {
            CommentTarget::Event(id) => Some(id),
            CommentTarget::Group(_) => None,
        }
    }
}

impl Comment {
    pub fn target(&self) -> Option<CommentTarget> {
        CommentTarget::from_ids(self.group_id, self.event_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub comment_id: Uuid,
    pub created_at: DateTime<Utc>,
}
