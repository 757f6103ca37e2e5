use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::Pagination;
use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub recipient_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    pub user_id: Uuid,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /messages/send
pub async fn send_message(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<SendMessage>,
) -> Result<HttpResponse> {
    let message = state
        .messaging
        .send(user.id, body.recipient_id, &body.content)
        .await?;
    Ok(HttpResponse::Created().json(message))
}

/// GET /messages/conversation?userId=
pub async fn conversation(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<ConversationQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();
    let messages = state
        .messaging
        .conversation(user.id, query.user_id, limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(messages))
}
