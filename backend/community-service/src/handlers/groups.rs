use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::Pagination;
use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::NewGroup;

/// GET /groups
pub async fn list_groups(
    state: web::Data<AppState>,
    page: web::Query<Pagination>,
) -> Result<HttpResponse> {
    let (limit, offset) = page.bounds();
    let groups = state.groups.list(limit, offset).await?;
    Ok(HttpResponse::Ok().json(groups))
}

/// POST /groups
pub async fn create_group(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<NewGroup>,
) -> Result<HttpResponse> {
    let group = state.groups.create_group(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(group))
}

/// GET /groups/{id}
pub async fn get_group(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let group = state.groups.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(group))
}

/// GET /groups/{id}/members
pub async fn list_members(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let members = state.groups.members(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(members))
}

/// POST /groups/{id}/join
pub async fn join_group(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let group_id = path.into_inner();
    state.groups.join(group_id, user.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "groupId": group_id, "member": true })))
}

/// POST /groups/{id}/leave
pub async fn leave_group(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let group_id = path.into_inner();
    state.groups.leave(group_id, user.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "groupId": group_id, "member": false })))
}
