//! Event attendance: seat and ticket accounting
//!
//! Runs the attendance manager against the in-memory store.

mod common;

use common::{managers, MemoryStore, RecordingPush};
use community_service::AppError;
use std::sync::Arc;
use uuid::Uuid;

fn setup() -> (MemoryStore, common::Managers, Uuid) {
    let store = MemoryStore::new();
    let admin = store.add_user("organizer");
    let group_id = store.add_group("Hikers", admin);
    let m = managers(&store, Arc::new(RecordingPush::default()));
    (store, m, group_id)
}

#[tokio::test]
async fn test_free_event_capacity_one() {
    let (store, m, group_id) = setup();
    let event_id = store.add_free_event(group_id, 1);
    let user1 = store.add_user("user1");
    let user2 = store.add_user("user2");

    let attendance = m.attendance.join(event_id, user1, None).await.unwrap();
    assert_eq!(attendance.user_id, user1);
    assert_eq!(attendance.ticket_type, None);

    let event = store.event(event_id);
    assert_eq!(event.availability, 0);
    assert_eq!(event.going, 1);

    let err = m.attendance.join(event_id, user2, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(store.event(event_id).availability, 0);
    assert_eq!(store.attendee_count(event_id), 1);
}

#[tokio::test]
async fn test_paid_event_vip_band_exhausted() {
    let (store, m, group_id) = setup();
    let event_id = store.add_paid_event(group_id, 10, &[("VIP", 5000, 1), ("Standard", 1500, 5)]);
    let user1 = store.add_user("user1");
    let user2 = store.add_user("user2");

    let attendance = m.attendance.join(event_id, user1, Some("VIP")).await.unwrap();
    assert_eq!(attendance.ticket_type.as_deref(), Some("VIP"));
    assert_eq!(store.band_count(event_id, "VIP"), 0);
    assert_eq!(store.event(event_id).availability, 9);

    let err = m
        .attendance
        .join(event_id, user2, Some("VIP"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(store.band_count(event_id, "VIP"), 0);

    // other bands are unaffected
    m.attendance
        .join(event_id, user2, Some("Standard"))
        .await
        .unwrap();
    assert_eq!(store.band_count(event_id, "Standard"), 4);
    assert_eq!(store.event(event_id).going, 2);
}

#[tokio::test]
async fn test_paid_event_requires_known_ticket_type() {
    let (store, m, group_id) = setup();
    let event_id = store.add_paid_event(group_id, 10, &[("VIP", 5000, 3)]);
    let user = store.add_user("user");

    let err = m.attendance.join(event_id, user, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = m
        .attendance
        .join(event_id, user, Some("Balcony"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    assert_eq!(store.event(event_id).availability, 10);
    assert_eq!(store.band_count(event_id, "VIP"), 3);
}

#[tokio::test]
async fn test_paid_band_blocked_when_event_sold_out() {
    let (store, m, group_id) = setup();
    let event_id = store.add_paid_event(group_id, 1, &[("VIP", 5000, 5)]);
    let user1 = store.add_user("user1");
    let user2 = store.add_user("user2");

    m.attendance.join(event_id, user1, Some("VIP")).await.unwrap();
    let err = m
        .attendance
        .join(event_id, user2, Some("VIP"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(store.band_count(event_id, "VIP"), 4);
}

#[tokio::test]
async fn test_free_event_ignores_ticket_type() {
    let (store, m, group_id) = setup();
    let event_id = store.add_free_event(group_id, 5);
    let user = store.add_user("user");

    let attendance = m
        .attendance
        .join(event_id, user, Some("VIP"))
        .await
        .unwrap();
    assert_eq!(attendance.ticket_type, None);
}

#[tokio::test]
async fn test_join_missing_event_or_user() {
    let (store, m, group_id) = setup();
    let event_id = store.add_free_event(group_id, 5);
    let user = store.add_user("user");

    let err = m
        .attendance
        .join(Uuid::new_v4(), user, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = m
        .attendance
        .join(event_id, Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(store.event(event_id).availability, 5);
}

#[tokio::test]
async fn test_join_twice_is_conflict() {
    let (store, m, group_id) = setup();
    let event_id = store.add_free_event(group_id, 5);
    let user = store.add_user("user");

    m.attendance.join(event_id, user, None).await.unwrap();
    let err = m.attendance.join(event_id, user, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let event = store.event(event_id);
    assert_eq!(event.availability, 4);
    assert_eq!(event.going, 1);
}

#[tokio::test]
async fn test_leave_non_attendee_is_not_found() {
    let (store, m, group_id) = setup();
    let event_id = store.add_free_event(group_id, 5);
    let user = store.add_user("user");

    let err = m.attendance.leave(event_id, user).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(store.event(event_id).availability, 5);
}

#[tokio::test]
async fn test_leave_removes_only_that_user() {
    let (store, m, group_id) = setup();
    let event_id = store.add_free_event(group_id, 5);
    let stays = store.add_user("stays");
    let leaves = store.add_user("leaves");

    m.attendance.join(event_id, stays, None).await.unwrap();
    m.attendance.join(event_id, leaves, None).await.unwrap();

    m.attendance.leave(event_id, leaves).await.unwrap();

    let attendees = m.attendance.attendees(event_id).await.unwrap();
    let ids: Vec<Uuid> = attendees.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![stays]);

    let event = store.event(event_id);
    assert_eq!(event.availability, 4);
    assert_eq!(event.going, 1);
}

#[tokio::test]
async fn test_leave_restores_the_band_held() {
    let (store, m, group_id) = setup();
    let event_id = store.add_paid_event(group_id, 10, &[("VIP", 5000, 1), ("Standard", 1500, 5)]);
    let user = store.add_user("user");

    m.attendance.join(event_id, user, Some("VIP")).await.unwrap();
    assert_eq!(store.band_count(event_id, "VIP"), 0);

    let released = m.attendance.leave(event_id, user).await.unwrap();
    assert_eq!(released.ticket_type.as_deref(), Some("VIP"));
    assert_eq!(store.band_count(event_id, "VIP"), 1);
    assert_eq!(store.band_count(event_id, "Standard"), 5);
    assert_eq!(store.event(event_id).availability, 10);
}

#[tokio::test]
async fn test_concurrent_joins_never_oversell() {
    let (store, m, group_id) = setup();
    let event_id = store.add_free_event(group_id, 3);
    let users: Vec<Uuid> = (0..10).map(|i| store.add_user(&format!("u{i}"))).collect();

    let attendance = Arc::new(m.attendance);
    let handles: Vec<_> = users
        .into_iter()
        .map(|user| {
            let attendance = attendance.clone();
            tokio::spawn(async move { attendance.join(event_id, user, None).await })
        })
        .collect();

    let mut joined = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => joined += 1,
            Err(AppError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(joined, 3);
    let event = store.event(event_id);
    assert_eq!(event.availability, 0);
    assert_eq!(event.going, 3);
}
