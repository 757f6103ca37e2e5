use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::Decision;

/// POST /connections/{senderId}/request/{recipientId}
pub async fn send_request(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (sender_id, recipient_id) = path.into_inner();
    if user.id != sender_id {
        return Err(AppError::Unauthorized(
            "requests can only be sent as yourself".into(),
        ));
    }

    let request = state
        .connections
        .send_request(sender_id, recipient_id)
        .await?;
    Ok(HttpResponse::Created().json(request))
}

async fn respond(
    state: &AppState,
    user: &AuthUser,
    request_id: Uuid,
    decision: Decision,
) -> Result<HttpResponse> {
    let request = state
        .connections
        .respond(request_id, user.id, decision)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "requestId": request.id,
        "requesterId": request.requester_id,
        "recipientId": request.recipient_id,
        "status": decision,
    })))
}

/// POST /connections/accept/{requestId}
pub async fn accept_request(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    respond(&state, &user, path.into_inner(), Decision::Accepted).await
}

/// POST /connections/reject/{requestId}
pub async fn reject_request(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    respond(&state, &user, path.into_inner(), Decision::Rejected).await
}

/// POST /connections/{senderId}/cancel/{recipientId}
pub async fn cancel_request(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (sender_id, recipient_id) = path.into_inner();
    state
        .connections
        .cancel(user.id, sender_id, recipient_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /connections/{connectionId}
pub async fn remove_connection(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.connections.remove(user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /connections/{userId}
pub async fn list_connections(
    state: web::Data<AppState>,
    viewer: MaybeAuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    let viewer = viewer.0.map(|u| u.id);
    if !state.profiles.can_view_connections(viewer, user_id).await? {
        return Err(AppError::Forbidden(
            "this user's connections are not visible to you".into(),
        ));
    }

    let connections = state.connections.list_connections(user_id).await?;
    Ok(HttpResponse::Ok().json(connections))
}

/// GET /connections/requests/pending
pub async fn pending_requests(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse> {
    let requests = state.connections.pending_requests(user.id).await?;
    Ok(HttpResponse::Ok().json(requests))
}
