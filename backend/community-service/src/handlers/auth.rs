use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::services::auth::{Session, SigninRequest, SignupRequest};

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_TTL_SECS: i64 = 600;

#[derive(Serialize)]
struct SessionResponse {
    user: User,
    token: String,
}

fn session_cookie<'a>(state: &AppState, token: String) -> Cookie<'a> {
    Cookie::build(state.config.jwt.cookie_name.clone(), token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_production())
        .max_age(CookieDuration::seconds(state.keys.ttl_secs()))
        .finish()
}

fn session_response(state: &AppState, session: Session, status: StatusCode) -> HttpResponse {
    HttpResponse::build(status)
        .cookie(session_cookie(state, session.token.clone()))
        .json(SessionResponse {
            user: session.user,
            token: session.token,
        })
}

/// POST /auth/signup
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let session = state.auth.signup(body.into_inner()).await?;
    Ok(session_response(&state, session, StatusCode::CREATED))
}

/// POST /auth/signin
pub async fn signin(
    state: web::Data<AppState>,
    body: web::Json<SigninRequest>,
) -> Result<HttpResponse> {
    let session = state.auth.signin(body.into_inner()).await?;
    Ok(session_response(&state, session, StatusCode::OK))
}

/// POST /auth/signout
pub async fn signout(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut cookie = Cookie::new(state.config.jwt.cookie_name.clone(), "");
    cookie.set_path("/");
    cookie.make_removal();
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({ "signedOut": true })))
}

/// GET /auth/whoami
pub async fn whoami(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse> {
    let user = state.auth.whoami(user.id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// GET /auth/google
pub async fn google_start(state: web::Data<AppState>) -> Result<HttpResponse> {
    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".into()))?;

    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    let oauth_state = hex::encode(bytes);
    let location = oauth.authorize_url(&oauth_state)?;

    let cookie = Cookie::build(OAUTH_STATE_COOKIE, oauth_state)
        .path("/auth/google")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.is_production())
        .max_age(CookieDuration::seconds(OAUTH_STATE_TTL_SECS))
        .finish();

    Ok(HttpResponse::Found()
        .cookie(cookie)
        .insert_header((header::LOCATION, location))
        .finish())
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallback {
    pub code: String,
    pub state: String,
}

/// GET /auth/google/callback
pub async fn google_callback(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<GoogleCallback>,
) -> Result<HttpResponse> {
    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".into()))?;

    let expected = req
        .cookie(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("missing OAuth state".into()))?;
    if expected != query.state {
        return Err(AppError::Unauthorized("OAuth state mismatch".into()));
    }

    let user = oauth.complete(&query.code).await?;
    let session = state.auth.session_for(user)?;

    let mut clear_state = Cookie::new(OAUTH_STATE_COOKIE, "");
    clear_state.set_path("/auth/google");
    clear_state.make_removal();

    Ok(HttpResponse::Found()
        .cookie(session_cookie(&state, session.token))
        .cookie(clear_state)
        .insert_header((header::LOCATION, state.config.app.frontend_url.clone()))
        .finish())
}
