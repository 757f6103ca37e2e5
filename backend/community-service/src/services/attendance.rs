/// Event attendance
///
/// Joining takes one general admission seat and, for paid events, one ticket
/// of the chosen price band. Leaving gives both back. The counter updates and
/// the attendee row are written in one store transaction whose decrements are
/// conditional, so concurrent joins cannot oversell.
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::record_event_join;
use crate::models::{Attendance, Reservation, UserSummary};
use crate::repository::{EventRepository, UserRepository};

#[derive(Clone)]
pub struct AttendanceManager {
    events: Arc<dyn EventRepository>,
    users: Arc<dyn UserRepository>,
}

impl AttendanceManager {
    pub fn new(events: Arc<dyn EventRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { events, users }
    }

    /// Add `user_id` to the event's attendees.
    ///
    /// `ticket_type` is required for paid events and ignored for free ones.
    pub async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        ticket_type: Option<&str>,
    ) -> Result<Attendance> {
        let result = self.try_join(event_id, user_id, ticket_type).await;
        record_event_join(match &result {
            Ok(_) => "joined",
            Err(AppError::Conflict(_)) => "conflict",
            Err(AppError::NotFound(_)) => "not_found",
            Err(AppError::InvalidInput(_)) => "invalid",
            Err(_) => "error",
        });
        result
    }

    async fn try_join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        ticket_type: Option<&str>,
    ) -> Result<Attendance> {
        let event = self
            .events
            .find(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))?;

        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound(format!("user {user_id}")));
        }

        if self.events.find_attendance(event_id, user_id).await?.is_some() {
            return Err(AppError::Conflict("user is already attending".into()));
        }

        let band = if event.is_free {
            None
        } else {
            let ticket_type = ticket_type.ok_or_else(|| {
                AppError::InvalidInput("ticketType is required for paid events".into())
            })?;
            let band = event.band(ticket_type).ok_or_else(|| {
                AppError::NotFound(format!("ticket type {ticket_type} for event {event_id}"))
            })?;
            if band.ticket_count <= 0 {
                return Err(AppError::Conflict(format!(
                    "no {ticket_type} tickets left"
                )));
            }
            Some(band.ticket_type.as_str())
        };

        if event.is_sold_out() {
            return Err(AppError::Conflict("event is sold out".into()));
        }

        match self.events.reserve(event_id, user_id, band).await? {
            Reservation::Reserved(attendance) => {
                info!(
                    event_id = %event_id,
                    user_id = %user_id,
                    ticket_type = attendance.ticket_type.as_deref().unwrap_or("general"),
                    "user joined event"
                );
                Ok(attendance)
            }
            Reservation::SoldOut => Err(AppError::Conflict("event is sold out".into())),
            Reservation::AlreadyAttending => {
                Err(AppError::Conflict("user is already attending".into()))
            }
        }
    }

    /// Remove `user_id` from the attendees and restore the seat and band ticket
    /// they held.
    pub async fn leave(&self, event_id: Uuid, user_id: Uuid) -> Result<Attendance> {
        if self.events.find(event_id).await?.is_none() {
            return Err(AppError::NotFound(format!("event {event_id}")));
        }

        let attendance = self
            .events
            .release(event_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user is not attending this event".into()))?;

        info!(event_id = %event_id, user_id = %user_id, "user left event");
        Ok(attendance)
    }

    pub async fn attendees(&self, event_id: Uuid) -> Result<Vec<UserSummary>> {
        if self.events.find(event_id).await?.is_none() {
            return Err(AppError::NotFound(format!("event {event_id}")));
        }
        self.events.attendees(event_id).await
    }
}
