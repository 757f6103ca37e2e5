//! Pieces shared by the socket actors
use actix::Message as ActixMessage;
use actix_web::{http::StatusCode, HttpRequest};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::middleware::auth::token_from_request;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// A serialized frame queued for one socket
#[derive(ActixMessage)]
#[rtype(result = "()")]
pub struct Outbound(pub String);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    pub user_id: Uuid,
    pub token: Option<String>,
}

/// Check that the socket's token belongs to the `userId` it claims.
pub fn authorize(req: &HttpRequest, query: &WsQuery, state: &AppState) -> Result<(), StatusCode> {
    let token = query
        .token
        .clone()
        .or_else(|| token_from_request(req, &state.config.jwt.cookie_name))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state.keys.verify(&token).map_err(|e| {
        tracing::warn!(user_id = %query.user_id, error = %e, "socket rejected: invalid token");
        StatusCode::UNAUTHORIZED
    })?;

    if claims.id != query.user_id {
        tracing::warn!(
            user_id = %query.user_id,
            token_user = %claims.id,
            "socket rejected: token belongs to another user"
        );
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}
