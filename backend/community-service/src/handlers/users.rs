use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::Result;
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::ProfileUpdate;

/// GET /users/{id}
pub async fn get_profile(
    state: web::Data<AppState>,
    viewer: MaybeAuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let viewer = viewer.0.map(|u| u.id);
    let profile = state.profiles.get(viewer, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PATCH /users/me
pub async fn update_me(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse> {
    let updated = state.profiles.update(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}
