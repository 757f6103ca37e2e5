use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::services::payments::WebhookOutcome;

const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentBody {
    pub event_id: Uuid,
    pub ticket_type: String,
}

/// POST /payments/intent
pub async fn create_intent(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<IntentBody>,
) -> Result<HttpResponse> {
    let intent = state
        .payments
        .create_intent(user.id, body.event_id, &body.ticket_type)
        .await?;
    Ok(HttpResponse::Created().json(intent))
}

/// POST /payments/webhook
///
/// Takes the raw body; the signature covers the exact bytes sent.
pub async fn webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".into()))?;

    let outcome = state
        .payments
        .handle_webhook(signature, &body, chrono::Utc::now().timestamp())
        .await?;

    let status = match outcome {
        WebhookOutcome::Joined(_) => "joined",
        WebhookOutcome::AlreadyAttending => "already_attending",
        WebhookOutcome::Unfulfilled(_) => "unfulfilled",
        WebhookOutcome::Ignored(_) => "ignored",
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({ "received": true, "status": status })))
}
