/// Event catalogue: creation by group admins and read access
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{Event, NewEvent};
use crate::repository::{EventRepository, GroupRepository};

#[derive(Clone)]
pub struct EventCatalog {
    events: Arc<dyn EventRepository>,
    groups: Arc<dyn GroupRepository>,
}

impl EventCatalog {
    pub fn new(events: Arc<dyn EventRepository>, groups: Arc<dyn GroupRepository>) -> Self {
        Self { events, groups }
    }

    pub async fn create(&self, caller_id: Uuid, input: NewEvent) -> Result<Event> {
        input.validate()?;
        validate_price_bands(&input)?;

        if self.groups.find(input.group_id).await?.is_none() {
            return Err(AppError::NotFound(format!("group {}", input.group_id)));
        }
        if !self.groups.is_admin(input.group_id, caller_id).await? {
            return Err(AppError::Forbidden(
                "only group admins can create events".into(),
            ));
        }

        let event = self.events.create(input).await?;
        info!(event_id = %event.id, group_id = %event.group_id, "event created");
        Ok(event)
    }

    pub async fn get(&self, event_id: Uuid) -> Result<Event> {
        self.events
            .find(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))
    }

    pub async fn list(&self, group_id: Option<Uuid>, limit: i64, offset: i64) -> Result<Vec<Event>> {
        self.events.list(group_id, limit, offset).await
    }
}

fn validate_price_bands(input: &NewEvent) -> Result<()> {
    if input.is_free {
        if !input.price_bands.is_empty() {
            return Err(AppError::InvalidInput(
                "free events cannot have price bands".into(),
            ));
        }
        return Ok(());
    }

    if input.price_bands.is_empty() {
        return Err(AppError::InvalidInput(
            "paid events need at least one price band".into(),
        ));
    }

    let mut seen = HashSet::new();
    for band in &input.price_bands {
        if band.ticket_type.trim().is_empty() {
            return Err(AppError::InvalidInput("ticketType cannot be empty".into()));
        }
        if band.price_cents < 0 || band.ticket_count < 0 {
            return Err(AppError::InvalidInput(format!(
                "price band {} has a negative price or count",
                band.ticket_type
            )));
        }
        if !seen.insert(band.ticket_type.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "duplicate ticket type {}",
                band.ticket_type
            )));
        }
    }
    Ok(())
}
