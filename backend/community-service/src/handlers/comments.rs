use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::Pagination;
use crate::app_state::AppState;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::CommentTarget;
use crate::services::comments::NewComment;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListQuery {
    pub group_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /comments
pub async fn create_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<NewComment>,
) -> Result<HttpResponse> {
    let comment = state.comments.create(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(comment))
}

/// GET /comments?groupId= | ?eventId=
pub async fn list_comments(
    state: web::Data<AppState>,
    query: web::Query<CommentListQuery>,
) -> Result<HttpResponse> {
    let target = CommentTarget::from_ids(query.group_id, query.event_id).ok_or_else(|| {
        AppError::InvalidInput("pass exactly one of groupId or eventId".into())
    })?;
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();

    let comments = state.comments.list(target, limit, offset).await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// DELETE /comments/{id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.comments.delete(user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /comments/{id}/like
pub async fn like_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comment_id = path.into_inner();
    let like = state.comments.like(user.id, comment_id).await?;
    let count = state.comments.like_count(comment_id).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "like": like, "likeCount": count })))
}

/// DELETE /comments/{id}/like
pub async fn unlike_comment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comment_id = path.into_inner();
    state.comments.unlike(user.id, comment_id).await?;
    let count = state.comments.like_count(comment_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "likeCount": count })))
}
