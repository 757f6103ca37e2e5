//! Shared helpers for integration tests
//!
//! `MemoryStore` implements every repository trait over plain maps behind one
//! mutex, so each repository call is atomic the same way a single SQL
//! transaction is. `RecordingPush` captures live pushes instead of writing to
//! sockets.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use community_service::error::{AppError, Result};
use community_service::models::{
    Attendance, ConnectionRequest, Event, Group, NewEvent, NewGroup, NewNotification,
    Notification, PriceBand, RequestStatus, Reservation, UserSummary,
};
use community_service::repository::{
    ConnectionRepository, EventRepository, GroupRepository, NotificationRepository, Repositories,
    UserRepository,
};
use community_service::services::{
    AttendanceManager, ConnectionWorkflow, EventCatalog, GroupMembership, NotificationDispatcher,
};
use community_service::websocket::{LiveEvent, LivePush};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserSummary>,
    events: HashMap<Uuid, Event>,
    attendance: Vec<Attendance>,
    groups: HashMap<Uuid, Group>,
    /// (group, user) -> is_admin, in join order
    members: Vec<(Uuid, Uuid, bool)>,
    requests: HashMap<Uuid, ConnectionRequest>,
    /// Both directions are stored, like the SQL table
    links: HashSet<(Uuid, Uuid)>,
    notifications: Vec<Notification>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.clone()),
            events: Arc::new(self.clone()),
            groups: Arc::new(self.clone()),
            connections: Arc::new(self.clone()),
            notifications: Arc::new(self.clone()),
        }
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().users.insert(
            id,
            UserSummary {
                id,
                username: username.to_string(),
                first_name: None,
                last_name: None,
                avatar_url: None,
            },
        );
        id
    }

    pub fn add_group(&self, name: &str, admin_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        state.groups.insert(id, group(id, name));
        state.members.push((id, admin_id, true));
        id
    }

    pub fn add_free_event(&self, group_id: Uuid, capacity: i32) -> Uuid {
        self.insert_event(group_id, capacity, true, Vec::new())
    }

    /// `bands` are `(ticket_type, price_cents, ticket_count)`
    pub fn add_paid_event(&self, group_id: Uuid, capacity: i32, bands: &[(&str, i64, i32)]) -> Uuid {
        let bands = bands
            .iter()
            .map(|(ticket_type, price_cents, ticket_count)| PriceBand {
                ticket_type: ticket_type.to_string(),
                price_cents: *price_cents,
                ticket_count: *ticket_count,
            })
            .collect();
        self.insert_event(group_id, capacity, false, bands)
    }

    fn insert_event(&self, group_id: Uuid, capacity: i32, is_free: bool, bands: Vec<PriceBand>) -> Uuid {
        let id = Uuid::new_v4();
        let event = Event {
            id,
            group_id,
            title: "Test event".into(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            duration_minutes: 120,
            capacity,
            availability: capacity,
            going: 0,
            is_free,
            created_at: Utc::now(),
            price_bands: bands,
        };
        self.state.lock().unwrap().events.insert(id, event);
        id
    }

    /// Snapshot of an event with its counters
    pub fn event(&self, event_id: Uuid) -> Event {
        self.state.lock().unwrap().events[&event_id].clone()
    }

    pub fn band_count(&self, event_id: Uuid, ticket_type: &str) -> i32 {
        self.event(event_id)
            .band(ticket_type)
            .map(|b| b.ticket_count)
            .unwrap_or_default()
    }

    pub fn attendee_count(&self, event_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .attendance
            .iter()
            .filter(|a| a.event_id == event_id)
            .count()
    }

    pub fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn pending_requests(&self) -> Vec<ConnectionRequest> {
        self.state.lock().unwrap().requests.values().cloned().collect()
    }

    pub fn is_linked(&self, a: Uuid, b: Uuid) -> (bool, bool) {
        let state = self.state.lock().unwrap();
        (state.links.contains(&(a, b)), state.links.contains(&(b, a)))
    }

    pub fn member_count(&self, group_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .members
            .iter()
            .filter(|(g, _, _)| *g == group_id)
            .count()
    }
}

fn group(id: Uuid, name: &str) -> Group {
    Group {
        id,
        name: name.to_string(),
        description: String::new(),
        is_open: true,
        category: None,
        location: None,
        is_approved: true,
        created_at: Utc::now(),
    }
}

fn page<T: Clone>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn exists(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.state.lock().unwrap().users.contains_key(&user_id))
    }

    async fn find_summary(&self, user_id: Uuid) -> Result<Option<UserSummary>> {
        Ok(self.state.lock().unwrap().users.get(&user_id).cloned())
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn create(&self, input: NewEvent) -> Result<Event> {
        let id = self.insert_event(input.group_id, input.capacity, input.is_free, input.price_bands);
        let mut state = self.state.lock().unwrap();
        let event = state.events.get_mut(&id).unwrap();
        event.title = input.title;
        event.description = input.description;
        event.date = input.date;
        event.start_time = input.start_time;
        event.duration_minutes = input.duration_minutes;
        Ok(event.clone())
    }

    async fn find(&self, event_id: Uuid) -> Result<Option<Event>> {
        Ok(self.state.lock().unwrap().events.get(&event_id).cloned())
    }

    async fn list(&self, group_id: Option<Uuid>, limit: i64, offset: i64) -> Result<Vec<Event>> {
        let state = self.state.lock().unwrap();
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| group_id.map_or(true, |g| e.group_id == g))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.date, e.start_time));
        Ok(page(events, limit, offset))
    }

    async fn find_attendance(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Attendance>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .attendance
            .iter()
            .find(|a| a.event_id == event_id && a.user_id == user_id)
            .cloned())
    }

    async fn attendees(&self, event_id: Uuid) -> Result<Vec<UserSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .attendance
            .iter()
            .filter(|a| a.event_id == event_id)
            .filter_map(|a| state.users.get(&a.user_id).cloned())
            .collect())
    }

    async fn reserve(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        ticket_type: Option<&str>,
    ) -> Result<Reservation> {
        let mut state = self.state.lock().unwrap();
        if state
            .attendance
            .iter()
            .any(|a| a.event_id == event_id && a.user_id == user_id)
        {
            return Ok(Reservation::AlreadyAttending);
        }

        let Some(event) = state.events.get_mut(&event_id) else {
            return Ok(Reservation::SoldOut);
        };
        if event.availability <= 0 {
            return Ok(Reservation::SoldOut);
        }
        if let Some(ticket_type) = ticket_type {
            match event
                .price_bands
                .iter_mut()
                .find(|b| b.ticket_type == ticket_type)
            {
                Some(band) if band.ticket_count > 0 => band.ticket_count -= 1,
                _ => return Ok(Reservation::SoldOut),
            }
        }
        event.availability -= 1;
        event.going += 1;

        let attendance = Attendance {
            event_id,
            user_id,
            ticket_type: ticket_type.map(str::to_string),
            joined_at: Utc::now(),
        };
        state.attendance.push(attendance.clone());
        Ok(Reservation::Reserved(attendance))
    }

    async fn release(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<Attendance>> {
        let mut state = self.state.lock().unwrap();
        let Some(pos) = state
            .attendance
            .iter()
            .position(|a| a.event_id == event_id && a.user_id == user_id)
        else {
            return Ok(None);
        };
        let attendance = state.attendance.remove(pos);

        if let Some(event) = state.events.get_mut(&event_id) {
            if let Some(ticket_type) = attendance.ticket_type.as_deref() {
                if let Some(band) = event
                    .price_bands
                    .iter_mut()
                    .find(|b| b.ticket_type == ticket_type)
                {
                    band.ticket_count += 1;
                }
            }
            event.availability = (event.availability + 1).min(event.capacity);
            event.going = (event.going - 1).max(0);
        }
        Ok(Some(attendance))
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create(&self, input: NewGroup, creator_id: Uuid) -> Result<Group> {
        let id = Uuid::new_v4();
        let mut created = group(id, &input.name);
        created.description = input.description;
        created.is_open = input.is_open;
        created.category = input.category;
        created.location = input.location;

        let mut state = self.state.lock().unwrap();
        state.groups.insert(id, created.clone());
        state.members.push((id, creator_id, true));
        Ok(created)
    }

    async fn find(&self, group_id: Uuid) -> Result<Option<Group>> {
        Ok(self.state.lock().unwrap().groups.get(&group_id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> = self.state.lock().unwrap().groups.values().cloned().collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(groups, limit, offset))
    }

    async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .iter()
            .any(|(g, u, _)| *g == group_id && *u == user_id))
    }

    async fn is_admin(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .iter()
            .any(|(g, u, admin)| *g == group_id && *u == user_id && *admin))
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state
            .members
            .iter()
            .any(|(g, u, _)| *g == group_id && *u == user_id)
        {
            return Ok(false);
        }
        state.members.push((group_id, user_id, false));
        Ok(true)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.members.len();
        state
            .members
            .retain(|(g, u, _)| !(*g == group_id && *u == user_id));
        Ok(state.members.len() < before)
    }

    async fn members(&self, group_id: Uuid) -> Result<Vec<UserSummary>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .iter()
            .filter(|(g, _, _)| *g == group_id)
            .filter_map(|(_, u, _)| state.users.get(u).cloned())
            .collect())
    }
}

#[async_trait]
impl ConnectionRepository for MemoryStore {
    async fn find_request(&self, request_id: Uuid) -> Result<Option<ConnectionRequest>> {
        Ok(self.state.lock().unwrap().requests.get(&request_id).cloned())
    }

    async fn find_pending_between(&self, a: Uuid, b: Uuid) -> Result<Option<ConnectionRequest>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .values()
            .find(|r| r.involves(a, b))
            .cloned())
    }

    async fn find_pending(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<ConnectionRequest>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .values()
            .find(|r| r.requester_id == requester_id && r.recipient_id == recipient_id)
            .cloned())
    }

    async fn create_request(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<ConnectionRequest>> {
        let mut state = self.state.lock().unwrap();
        if state.links.contains(&(requester_id, recipient_id))
            || state
                .requests
                .values()
                .any(|r| r.involves(requester_id, recipient_id))
        {
            return Ok(None);
        }
        let request = ConnectionRequest {
            id: Uuid::new_v4(),
            requester_id,
            recipient_id,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        };
        state.requests.insert(request.id, request.clone());
        Ok(Some(request))
    }

    async fn delete_request(&self, request_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .remove(&request_id)
            .is_some())
    }

    async fn are_connected(&self, a: Uuid, b: Uuid) -> Result<bool> {
        Ok(self.state.lock().unwrap().links.contains(&(a, b)))
    }

    async fn accept_request(&self, request_id: Uuid) -> Result<Option<ConnectionRequest>> {
        let mut state = self.state.lock().unwrap();
        let Some(request) = state.requests.remove(&request_id) else {
            return Ok(None);
        };
        state.links.insert((request.requester_id, request.recipient_id));
        state.links.insert((request.recipient_id, request.requester_id));
        Ok(Some(request))
    }

    async fn unlink(&self, a: Uuid, b: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let forward = state.links.remove(&(a, b));
        let backward = state.links.remove(&(b, a));
        Ok(forward || backward)
    }

    async fn connections_of(&self, user_id: Uuid) -> Result<Vec<UserSummary>> {
        let state = self.state.lock().unwrap();
        let mut connections: Vec<UserSummary> = state
            .links
            .iter()
            .filter(|(a, _)| *a == user_id)
            .filter_map(|(_, b)| state.users.get(b).cloned())
            .collect();
        connections.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(connections)
    }

    async fn pending_for(&self, recipient_id: Uuid) -> Result<Vec<ConnectionRequest>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .requests
            .values()
            .filter(|r| r.recipient_id == recipient_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert(&self, input: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            sender_id: input.sender_id,
            kind: input.kind,
            message: input.message,
            event_id: input.event_id,
            is_read: false,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .notifications
            .push(notification.clone());
        Ok(notification)
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let state = self.state.lock().unwrap();
        let items: Vec<Notification> = state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        Ok(page(items, limit, offset))
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let mut updated = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| !(n.id == notification_id && n.user_id == user_id));
        Ok(state.notifications.len() < before)
    }

    async fn delete_unread(&self, user_id: Uuid, sender_id: Uuid, kind: &str) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.notifications.len();
        state.notifications.retain(|n| {
            !(n.user_id == user_id && n.sender_id == sender_id && n.kind == kind && !n.is_read)
        });
        Ok((before - state.notifications.len()) as u64)
    }
}

/// Captures every live push as `(user_id, event)`
#[derive(Clone, Default)]
pub struct RecordingPush {
    pushed: Arc<Mutex<Vec<(Uuid, LiveEvent)>>>,
}

impl RecordingPush {
    pub fn pushed_to(&self, user_id: Uuid) -> Vec<LiveEvent> {
        self.pushed
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pushed.lock().unwrap().len()
    }
}

#[async_trait]
impl LivePush for RecordingPush {
    async fn push(&self, user_id: Uuid, event: &LiveEvent) -> Result<()> {
        self.pushed.lock().unwrap().push((user_id, event.clone()));
        Ok(())
    }
}

/// A push transport that always fails, for checking that delivery errors
/// never reach the caller
pub struct FailingPush;

#[async_trait]
impl LivePush for FailingPush {
    async fn push(&self, _user_id: Uuid, _event: &LiveEvent) -> Result<()> {
        Err(AppError::Internal("socket gone".into()))
    }
}

/// Notification store whose writes fail after the store is built; reads go
/// to the wrapped `MemoryStore`
pub struct FailingNotifications(pub MemoryStore);

#[async_trait]
impl NotificationRepository for FailingNotifications {
    async fn insert(&self, _input: NewNotification) -> Result<Notification> {
        Err(AppError::Internal("notifications table unavailable".into()))
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        NotificationRepository::list(&self.0, user_id, unread_only, limit, offset).await
    }

    async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool> {
        NotificationRepository::mark_read(&self.0, user_id, notification_id).await
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        NotificationRepository::mark_all_read(&self.0, user_id).await
    }

    async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool> {
        NotificationRepository::delete(&self.0, user_id, notification_id).await
    }

    async fn delete_unread(&self, _user_id: Uuid, _sender_id: Uuid, _kind: &str) -> Result<u64> {
        Err(AppError::Internal("notifications table unavailable".into()))
    }
}

/// Connection workflow over `store` whose notification writes always fail
pub fn workflow_with_failing_notifications(
    store: &MemoryStore,
    live: Arc<dyn LivePush>,
) -> ConnectionWorkflow {
    let repos = store.repositories();
    let notifications = NotificationDispatcher::new(
        Arc::new(FailingNotifications(store.clone())),
        repos.users.clone(),
        repos.events.clone(),
        live,
    );
    ConnectionWorkflow::new(repos.connections.clone(), repos.users.clone(), notifications)
}

/// The four managers wired over one store
pub struct Managers {
    pub attendance: AttendanceManager,
    pub connections: ConnectionWorkflow,
    pub notifications: NotificationDispatcher,
    pub groups: GroupMembership,
    pub events: EventCatalog,
}

pub fn managers(store: &MemoryStore, live: Arc<dyn LivePush>) -> Managers {
    let repos = store.repositories();
    let notifications = NotificationDispatcher::new(
        repos.notifications.clone(),
        repos.users.clone(),
        repos.events.clone(),
        live,
    );
    Managers {
        attendance: AttendanceManager::new(repos.events.clone(), repos.users.clone()),
        connections: ConnectionWorkflow::new(
            repos.connections.clone(),
            repos.users.clone(),
            notifications.clone(),
        ),
        groups: GroupMembership::new(repos.groups.clone(), repos.users.clone()),
        events: EventCatalog::new(repos.events.clone(), repos.groups.clone()),
        notifications,
    }
}
