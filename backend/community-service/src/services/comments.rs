/// Threaded comments on groups and events, and likes on comments
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use super::NotificationDispatcher;
use crate::db::{comment_repo, like_repo};
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentTarget, Like, NotificationKind};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub group_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

#[derive(Clone)]
pub struct CommentService {
    db: PgPool,
    notifier: NotificationDispatcher,
}

impl CommentService {
    pub fn new(db: PgPool, notifier: NotificationDispatcher) -> Self {
        Self { db, notifier }
    }

    pub async fn create(&self, user_id: Uuid, input: NewComment) -> Result<Comment> {
        input.validate()?;
        let target = CommentTarget::from_ids(input.group_id, input.event_id).ok_or_else(|| {
            AppError::InvalidInput("a comment needs exactly one of groupId or eventId".into())
        })?;

        let exists = match target {
            CommentTarget::Group(id) => comment_repo::group_exists(&self.db, id).await?,
            CommentTarget::Event(id) => comment_repo::event_exists(&self.db, id).await?,
        };
        if !exists {
            return Err(AppError::NotFound("comment target".into()));
        }

        if let Some(parent_id) = input.parent_id {
            let parent = comment_repo::find_comment(&self.db, parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("comment {parent_id}")))?;
            if parent.target() != Some(target) {
                return Err(AppError::InvalidInput(
                    "a reply must be on the same group or event as its parent".into(),
                ));
            }
        }

        let comment = comment_repo::create_comment(
            &self.db,
            user_id,
            target,
            input.parent_id,
            input.content.trim(),
        )
        .await?;
        info!(comment_id = %comment.id, user_id = %user_id, "comment created");
        Ok(comment)
    }

    pub async fn list(&self, target: CommentTarget, limit: i64, offset: i64) -> Result<Vec<Comment>> {
        Ok(comment_repo::list_by_target(&self.db, target, limit, offset).await?)
    }

    /// Authors may delete their own comments only.
    pub async fn delete(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        let comment = comment_repo::find_comment(&self.db, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {comment_id}")))?;
        if comment.user_id != user_id {
            return Err(AppError::Forbidden(
                "only the author can delete a comment".into(),
            ));
        }

        comment_repo::delete_comment(&self.db, comment_id, user_id).await?;
        Ok(())
    }

    /// Like a comment and let its author know, unless they liked their own.
    pub async fn like(&self, user_id: Uuid, comment_id: Uuid) -> Result<Like> {
        let comment = comment_repo::find_comment(&self.db, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {comment_id}")))?;

        let like = like_repo::create_like(&self.db, user_id, comment_id)
            .await?
            .ok_or_else(|| AppError::Conflict("comment already liked".into()))?;

        if comment.user_id != user_id {
            if let Err(e) = self
                .notifier
                .dispatch(
                    comment.user_id,
                    user_id,
                    NotificationKind::CommentLiked.as_str(),
                    "Someone liked your comment",
                    comment.event_id,
                )
                .await
            {
                error!(comment_id = %comment_id, error = %e, "failed to notify comment author");
            }
        }

        Ok(like)
    }

    pub async fn unlike(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        if !like_repo::delete_like(&self.db, user_id, comment_id).await? {
            return Err(AppError::NotFound("like".into()));
        }
        Ok(())
    }

    pub async fn like_count(&self, comment_id: Uuid) -> Result<i64> {
        Ok(like_repo::count_likes(&self.db, comment_id).await?)
    }
}
