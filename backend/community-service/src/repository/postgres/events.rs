use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::USER_SUMMARY_COLUMNS;
use crate::error::Result;
use crate::models::{Attendance, Event, NewEvent, PriceBand, Reservation, UserSummary};
use crate::repository::EventRepository;

const EVENT_COLUMNS: &str = "id, group_id, title, description, date, start_time, duration_minutes, \
     capacity, availability, going, is_free, created_at";

#[derive(FromRow)]
struct BandRow {
    event_id: Uuid,
    ticket_type: String,
    price_cents: i64,
    ticket_count: i32,
}

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_bands(&self, events: &mut [Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let rows = sqlx::query_as::<_, BandRow>(
            r#"
            SELECT event_id, ticket_type, price_cents, ticket_count
            FROM event_price_bands
            WHERE event_id = ANY($1)
            ORDER BY price_cents, ticket_type
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_event: HashMap<Uuid, Vec<PriceBand>> = HashMap::new();
        for row in rows {
            by_event.entry(row.event_id).or_default().push(PriceBand {
                ticket_type: row.ticket_type,
                price_cents: row.price_cents,
                ticket_count: row.ticket_count,
            });
        }

        for event in events.iter_mut() {
            event.price_bands = by_event.remove(&event.id).unwrap_or_default();
        }

        Ok(())
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn create(&self, input: NewEvent) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let mut event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (id, group_id, title, description, date, start_time,
                                duration_minutes, capacity, availability, going, is_free)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, 0, $9)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.group_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.date)
        .bind(input.start_time)
        .bind(input.duration_minutes)
        .bind(input.capacity)
        .bind(input.is_free)
        .fetch_one(&mut *tx)
        .await?;

        for band in &input.price_bands {
            sqlx::query(
                r#"
                INSERT INTO event_price_bands (event_id, ticket_type, price_cents, ticket_count)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(event.id)
            .bind(&band.ticket_type)
            .bind(band.price_cents)
            .bind(band.ticket_count)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        event.price_bands = input.price_bands;
        Ok(event)
    }

    async fn find(&self, event_id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        match event {
            Some(event) => {
                let mut events = [event];
                self.attach_bands(&mut events).await?;
                let [event] = events;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, group_id: Option<Uuid>, limit: i64, offset: i64) -> Result<Vec<Event>> {
        let mut events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE ($1::uuid IS NULL OR group_id = $1)
            ORDER BY date, start_time
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(group_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        self.attach_bands(&mut events).await?;
        Ok(events)
    }

    async fn find_attendance(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Attendance>> {
        let attendance = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT event_id, user_id, ticket_type, joined_at
            FROM event_attendees
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attendance)
    }

    async fn attendees(&self, event_id: Uuid) -> Result<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(&format!(
            r#"
            SELECT {USER_SUMMARY_COLUMNS}
            FROM event_attendees a
            JOIN users u ON u.id = a.user_id
            WHERE a.event_id = $1
            ORDER BY a.joined_at
            "#
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn reserve(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        ticket_type: Option<&str>,
    ) -> Result<Reservation> {
        let mut tx = self.pool.begin().await?;

        // The primary key on (event_id, user_id) decides duplicate joins
        let attendance = sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO event_attendees (event_id, user_id, ticket_type)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id, user_id) DO NOTHING
            RETURNING event_id, user_id, ticket_type, joined_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(ticket_type)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(attendance) = attendance else {
            tx.rollback().await?;
            return Ok(Reservation::AlreadyAttending);
        };

        if let Some(ticket_type) = ticket_type {
            let band = sqlx::query(
                r#"
                UPDATE event_price_bands
                SET ticket_count = ticket_count - 1
                WHERE event_id = $1 AND ticket_type = $2 AND ticket_count > 0
                "#,
            )
            .bind(event_id)
            .bind(ticket_type)
            .execute(&mut *tx)
            .await?;

            if band.rows_affected() == 0 {
                debug!(event_id = %event_id, ticket_type, "price band exhausted");
                tx.rollback().await?;
                return Ok(Reservation::SoldOut);
            }
        }

        let seat = sqlx::query(
            r#"
            UPDATE events
            SET availability = availability - 1, going = going + 1
            WHERE id = $1 AND availability > 0
            "#,
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        if seat.rows_affected() == 0 {
            debug!(event_id = %event_id, "event has no seats left");
            tx.rollback().await?;
            return Ok(Reservation::SoldOut);
        }

        tx.commit().await?;
        Ok(Reservation::Reserved(attendance))
    }

    async fn release(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Attendance>> {
        let mut tx = self.pool.begin().await?;

        let attendance = sqlx::query_as::<_, Attendance>(
            r#"
            DELETE FROM event_attendees
            WHERE event_id = $1 AND user_id = $2
            RETURNING event_id, user_id, ticket_type, joined_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(attendance) = attendance else {
            tx.rollback().await?;
            return Ok(None);
        };

        if let Some(ticket_type) = attendance.ticket_type.as_deref() {
            sqlx::query(
                r#"
                UPDATE event_price_bands
                SET ticket_count = ticket_count + 1
                WHERE event_id = $1 AND ticket_type = $2
                "#,
            )
            .bind(event_id)
            .bind(ticket_type)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE events
            SET availability = LEAST(availability + 1, capacity),
                going = GREATEST(going - 1, 0)
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(attendance))
    }
}
