//! Repository traits for the relational store.
//!
//! The managers in `services` only talk to these traits. `postgres` holds the
//! sqlx implementations used by the server.

pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Attendance, ConnectionRequest, Event, Group, NewEvent, NewGroup, NewNotification,
    Notification, Reservation, UserSummary,
};

pub use postgres::{
    PgConnectionRepository, PgEventRepository, PgGroupRepository, PgNotificationRepository,
    PgUserRepository,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn exists(&self, user_id: Uuid) -> Result<bool>;

    async fn find_summary(&self, user_id: Uuid) -> Result<Option<UserSummary>>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert an event with its price bands; availability starts at capacity.
    async fn create(&self, input: NewEvent) -> Result<Event>;

    /// Load an event together with its price bands.
    async fn find(&self, event_id: Uuid) -> Result<Option<Event>>;

    async fn list(&self, group_id: Option<Uuid>, limit: i64, offset: i64) -> Result<Vec<Event>>;

    async fn find_attendance(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Attendance>>;

    async fn attendees(&self, event_id: Uuid) -> Result<Vec<UserSummary>>;

    /// Atomically record attendance and take one seat (and one ticket of
    /// `ticket_type` when given). Counters never go below zero: when any of
    /// them is exhausted nothing is written and `SoldOut` is returned.
    async fn reserve(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        ticket_type: Option<&str>,
    ) -> Result<Reservation>;

    /// Atomically drop the attendance row and give back the seat and the band
    /// ticket it held. Returns `None` when the user was not attending.
    async fn release(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Attendance>>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Insert a group with `creator_id` as its first admin and member.
    async fn create(&self, input: NewGroup, creator_id: Uuid) -> Result<Group>;

    async fn find(&self, group_id: Uuid) -> Result<Option<Group>>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Group>>;

    async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn is_admin(&self, group_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Returns true if a membership row was inserted.
    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Returns true if a membership row was removed.
    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn members(&self, group_id: Uuid) -> Result<Vec<UserSummary>>;
}

#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn find_request(&self, request_id: Uuid) -> Result<Option<ConnectionRequest>>;

    /// Pending request between the two users in either direction
    async fn find_pending_between(&self, a: Uuid, b: Uuid) -> Result<Option<ConnectionRequest>>;

    /// Pending request from `requester_id` to `recipient_id` only
    async fn find_pending(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<ConnectionRequest>>;

    /// Returns `None` if a pending request for the pair already exists or the
    /// two users are already connected.
    async fn create_request(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<ConnectionRequest>>;

    /// Returns true if this call removed the row.
    async fn delete_request(&self, request_id: Uuid) -> Result<bool>;

    /// Delete the request and link both users in one step. Returns `None`
    /// when the request was already gone, in which case nothing is linked.
    async fn accept_request(&self, request_id: Uuid) -> Result<Option<ConnectionRequest>>;

    async fn are_connected(&self, a: Uuid, b: Uuid) -> Result<bool>;

    /// Remove both directions. Returns true if anything was removed.
    async fn unlink(&self, a: Uuid, b: Uuid) -> Result<bool>;

    async fn connections_of(&self, user_id: Uuid) -> Result<Vec<UserSummary>>;

    async fn pending_for(&self, recipient_id: Uuid) -> Result<Vec<ConnectionRequest>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, input: NewNotification) -> Result<Notification>;

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>>;

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;

    async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool>;

    /// Remove unread notifications of `kind` sent by `sender_id` to `user_id`.
    async fn delete_unread(&self, user_id: Uuid, sender_id: Uuid, kind: &str) -> Result<u64>;
}

/// Trait-object handles for every repository, shared by the managers
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub events: Arc<dyn EventRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub connections: Arc<dyn ConnectionRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn postgres(pool: &sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            events: Arc::new(PgEventRepository::new(pool.clone())),
            groups: Arc::new(PgGroupRepository::new(pool.clone())),
            connections: Arc::new(PgConnectionRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
        }
    }
}
