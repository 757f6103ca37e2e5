use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A named ticket tier of a paid event with its own remaining inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PriceBand {
    pub ticket_type: String,
    /// Price in the currency's minor unit
    pub price_cents: i64,
    pub ticket_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub capacity: i32,
    /// Remaining general admission seats
    pub availability: i32,
    pub going: i32,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub price_bands: Vec<PriceBand>,
}

impl Event {
    pub fn band(&self, ticket_type: &str) -> Option<&PriceBand> {
        self.price_bands.iter().find(|b| b.ticket_type == ticket_type)
    }

    pub fn is_sold_out(&self) -> bool {
        self.availability <= 0
    }
}

/// One user's attendance, including the band they hold for paid events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub ticket_type: Option<String>,
    pub joined_at: DateTime<Utc>,
}

/// Outcome of an atomic seat reservation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    Reserved(Attendance),
    SoldOut,
    AlreadyAttending,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub group_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub description: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
    #[validate(range(min = 1))]
    pub capacity: i32,
    #[serde(default = "default_free")]
    pub is_free: bool,
    #[serde(default)]
    pub price_bands: Vec<PriceBand>,
}

fn default_free() -> bool {
    true
}
