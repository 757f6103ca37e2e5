/// Paid tickets: payment intents and the provider's success webhook.
///
/// The intent carries `{eventId, userId, ticketType}` as metadata; the seat is
/// only taken when the provider reports `payment_intent.succeeded`.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::AttendanceManager;
use crate::config::PaymentConfig;
use crate::error::{AppError, Result};
use crate::models::Attendance;
use crate::repository::EventRepository;
use crate::security::webhook::verify_signature;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub amount: i64,
    pub currency: String,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub ticket_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    #[serde(alias = "client_secret")]
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

/// Card payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent>;
}

/// Stripe-compatible HTTP gateway
pub struct StripeGateway {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            http: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent> {
        let amount = request.amount.to_string();
        let event_id = request.event_id.to_string();
        let user_id = request.user_id.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
            ("metadata[eventId]", event_id.as_str()),
            ("metadata[userId]", user_id.as_str()),
            ("metadata[ticketType]", request.ticket_type.as_str()),
        ];

        let resp = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("payment provider unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Payment(format!(
                "payment provider returned {status}: {body}"
            )));
        }

        resp.json::<PaymentIntent>()
            .await
            .map_err(|e| AppError::Payment(format!("unreadable payment intent: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: WebhookObject,
}

#[derive(Debug, Deserialize)]
struct WebhookObject {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Joined(Attendance),
    /// Redelivery of a payment that already produced an attendance
    AlreadyAttending,
    /// Paid but no seat could be taken; needs manual follow-up
    Unfulfilled(String),
    Ignored(String),
}

#[derive(Clone)]
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    events: Arc<dyn EventRepository>,
    attendance: AttendanceManager,
    currency: String,
    webhook_secret: String,
}

impl PaymentService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        events: Arc<dyn EventRepository>,
        attendance: AttendanceManager,
        config: &PaymentConfig,
    ) -> Self {
        Self {
            gateway,
            events,
            attendance,
            currency: config.currency.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    /// Start a payment for one ticket of `ticket_type`.
    pub async fn create_intent(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        ticket_type: &str,
    ) -> Result<PaymentIntent> {
        let event = self
            .events
            .find(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))?;
        if event.is_free {
            return Err(AppError::InvalidInput("event is free".into()));
        }
        let band = event.band(ticket_type).ok_or_else(|| {
            AppError::NotFound(format!("ticket type {ticket_type} for event {event_id}"))
        })?;
        if band.ticket_count <= 0 || event.is_sold_out() {
            return Err(AppError::Conflict(format!("no {ticket_type} tickets left")));
        }

        let request = IntentRequest {
            amount: band.price_cents,
            currency: self.currency.clone(),
            event_id,
            user_id,
            ticket_type: ticket_type.to_string(),
        };

        match self.gateway.create_intent(&request).await {
            Ok(intent) => {
                info!(intent_id = %intent.id, event_id = %event_id, user_id = %user_id, "payment intent created");
                Ok(intent)
            }
            Err(e) => {
                error!(event_id = %event_id, user_id = %user_id, error = %e, "payment intent failed");
                Err(AppError::BadRequest("payment could not be started".into()))
            }
        }
    }

    /// Verify and apply a provider webhook. `now` is the current unix time.
    pub async fn handle_webhook(
        &self,
        signature: &str,
        payload: &[u8],
        now: i64,
    ) -> Result<WebhookOutcome> {
        verify_signature(&self.webhook_secret, signature, payload, now)?;

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| AppError::InvalidInput(format!("malformed webhook payload: {e}")))?;
        if event.kind != "payment_intent.succeeded" {
            return Ok(WebhookOutcome::Ignored(event.kind));
        }

        let intent = event.data.object;
        let event_id = metadata_uuid(&intent.metadata, "eventId")?;
        let user_id = metadata_uuid(&intent.metadata, "userId")?;
        let ticket_type = intent
            .metadata
            .get("ticketType")
            .ok_or_else(|| AppError::InvalidInput("webhook metadata missing ticketType".into()))?;

        match self
            .attendance
            .join(event_id, user_id, Some(ticket_type))
            .await
        {
            Ok(attendance) => {
                info!(intent_id = %intent.id, event_id = %event_id, user_id = %user_id, "paid ticket issued");
                Ok(WebhookOutcome::Joined(attendance))
            }
            Err(AppError::Conflict(reason)) => {
                if self
                    .events
                    .find_attendance(event_id, user_id)
                    .await?
                    .is_some()
                {
                    return Ok(WebhookOutcome::AlreadyAttending);
                }
                warn!(intent_id = %intent.id, event_id = %event_id, user_id = %user_id, reason = %reason, "payment succeeded but no seat was available");
                Ok(WebhookOutcome::Unfulfilled(reason))
            }
            Err(e) => Err(e),
        }
    }
}

fn metadata_uuid(metadata: &HashMap<String, String>, key: &str) -> Result<Uuid> {
    metadata
        .get(key)
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| AppError::InvalidInput(format!("webhook metadata missing {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_uuid() {
        let id = Uuid::new_v4();
        let mut metadata = HashMap::new();
        metadata.insert("eventId".to_string(), id.to_string());
        metadata.insert("userId".to_string(), "nope".to_string());

        assert_eq!(metadata_uuid(&metadata, "eventId").unwrap(), id);
        assert!(metadata_uuid(&metadata, "userId").is_err());
        assert!(metadata_uuid(&metadata, "ticketType").is_err());
    }

    #[test]
    fn test_parse_provider_intent() {
        let intent: PaymentIntent = serde_json::from_value(serde_json::json!({
            "id": "pi_123",
            "client_secret": "pi_123_secret",
            "amount": 2500,
            "currency": "usd",
            "status": "requires_payment_method"
        }))
        .unwrap();
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret"));
        assert_eq!(intent.amount, 2500);
    }
}
