use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::NewEvent;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub group_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinQuery {
    pub ticket_type: Option<String>,
}

/// GET /events
pub async fn list_events(
    state: web::Data<AppState>,
    query: web::Query<EventListQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = super::Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();
    let events = state.events.list(query.group_id, limit, offset).await?;
    Ok(HttpResponse::Ok().json(events))
}

/// POST /events
pub async fn create_event(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<NewEvent>,
) -> Result<HttpResponse> {
    let event = state.events.create(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(event))
}

/// GET /events/{id}
pub async fn get_event(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let event = state.events.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

/// GET /events/{id}/attendees
pub async fn list_attendees(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let attendees = state.attendance.attendees(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(attendees))
}

/// POST /events/{id}/join?ticketType=
pub async fn join_event(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    query: web::Query<JoinQuery>,
) -> Result<HttpResponse> {
    let attendance = state
        .attendance
        .join(path.into_inner(), user.id, query.ticket_type.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(attendance))
}

/// POST /events/{id}/leave
pub async fn leave_event(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let attendance = state.attendance.leave(path.into_inner(), user.id).await?;
    Ok(HttpResponse::Ok().json(attendance))
}
