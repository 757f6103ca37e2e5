use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::Pagination;
use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /notifications
pub async fn list_notifications(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();
    let notifications = state
        .notifications
        .list(user.id, query.unread_only, limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// PATCH /notifications
pub async fn mark_all_read(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse> {
    let updated = state.notifications.mark_all_read(user.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}

/// PATCH /notifications/{id}
pub async fn mark_read(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state
        .notifications
        .mark_read(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /notifications/{id}
pub async fn delete_notification(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state
        .notifications
        .delete(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
