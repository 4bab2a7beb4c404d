use std::sync::Arc;

use chrono::{Duration, Utc};
use temp_dir::TempDir;
use uuid::Uuid;

use tessera_booking::models::{BookingStatus, Event};
use tessera_booking::store::{BookingStore, StoreError};
use tessera_booking::{BookingLedger, BookingOutcome};
use tessera_store::{DbClient, SqliteBookingStore};

async fn setup() -> (TempDir, Arc<SqliteBookingStore>) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.child("tessera.db").display());
    let db = DbClient::new(&url, 5).await.unwrap();
    db.migrate().await.unwrap();
    (dir, Arc::new(SqliteBookingStore::new(db.pool.clone())))
}

fn event_in_days(days: i64, capacity: i64, price_cents: i64, title: &str) -> Event {
    Event::new(
        title.to_string(),
        format!("{title} description"),
        "Main Hall".to_string(),
        Utc::now() + Duration::days(days),
        capacity,
        price_cents,
        None,
        "org-1".to_string(),
    )
}

#[tokio::test]
async fn test_booking_decrements_counter_and_records_confirmed_row() {
    let (_dir, store) = setup().await;
    let event = event_in_days(30, 10, 2500, "Jazz Night");
    store.create_event(&event).await.unwrap();

    let booking = store.book_seats(event.id, "user-1", 5).await.unwrap();

    assert_eq!(booking.seats, 5);
    assert_eq!(booking.total_cents, 12_500);
    assert_eq!(booking.status, BookingStatus::Confirmed);

    let stored = store.find_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.available_seats, 5);

    let bookings = store.bookings_for_user("user-1").await.unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].0.id, booking.id);
    assert_eq!(bookings[0].1.id, event.id);
}

#[tokio::test]
async fn test_overbooking_rejected_without_mutation() {
    let (_dir, store) = setup().await;
    let event = event_in_days(30, 10, 2500, "Jazz Night");
    store.create_event(&event).await.unwrap();

    store.book_seats(event.id, "user-1", 5).await.unwrap();

    let err = store.book_seats(event.id, "user-2", 6).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientSeats {
            requested: 6,
            available: 5
        }
    ));

    let stored = store.find_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.available_seats, 5);
    assert!(store.bookings_for_user("user-2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_booking_unknown_event_rejected() {
    let (_dir, store) = setup().await;

    let missing = Uuid::new_v4();
    let err = store.book_seats(missing, "user-1", 1).await.unwrap_err();

    assert!(matches!(err, StoreError::EventNotFound(id) if id == missing));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_never_oversell() {
    let (_dir, store) = setup().await;
    let event = event_in_days(30, 5, 1000, "Small Room");
    store.create_event(&event).await.unwrap();

    let ledger = Arc::new(BookingLedger::new(store.clone()).with_conflict_retries(5));

    let mut handles = Vec::new();
    for _ in 0..12 {
        let ledger = ledger.clone();
        let event_id = event.id;
        handles.push(tokio::spawn(
            async move { ledger.book(event_id, "user-1", 1).await },
        ));
    }

    let mut confirmed = 0;
    let mut sold_out = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            BookingOutcome::Confirmed(_) => confirmed += 1,
            BookingOutcome::Rejected(reason) => {
                assert_eq!(reason.message(), "Not enough seats remaining for this event.");
                sold_out += 1;
            }
        }
    }

    assert_eq!(confirmed, 5);
    assert_eq!(sold_out, 7);

    let stored = store.find_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.available_seats, 0);

    let bookings = store.bookings_for_user("user-1").await.unwrap();
    let claimed: i64 = bookings.iter().map(|(booking, _)| booking.seats).sum();
    assert_eq!(claimed, stored.capacity);
}

#[tokio::test]
async fn test_release_returns_seats_but_never_exceeds_capacity() {
    let (_dir, store) = setup().await;
    let event = event_in_days(30, 10, 2000, "Workshop");
    store.create_event(&event).await.unwrap();

    store.book_seats(event.id, "user-1", 4).await.unwrap();
    store.release_seats(event.id, 4).await.unwrap();

    let stored = store.find_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.available_seats, 10);

    let err = store.release_seats(event.id, 1).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::ReleaseExceedsCapacity {
            returned: 1,
            available: 10,
            capacity: 10
        }
    ));

    let stored = store.find_event(event.id).await.unwrap().unwrap();
    assert_eq!(stored.available_seats, 10);
}

#[tokio::test]
async fn test_upcoming_events_filters_and_orders() {
    let (_dir, store) = setup().await;

    let past = event_in_days(-7, 50, 1000, "Retro Party");
    let soon = event_in_days(3, 50, 1000, "Jazz Night");
    let later = event_in_days(45, 50, 1000, "Opera Gala");
    for event in [&past, &soon, &later] {
        store.create_event(event).await.unwrap();
    }

    let upcoming = store.upcoming_events(None).await.unwrap();
    let titles: Vec<&str> = upcoming.iter().map(|event| event.title.as_str()).collect();
    assert_eq!(titles, vec!["Jazz Night", "Opera Gala"]);

    let matched = store.upcoming_events(Some("opera")).await.unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].title, "Opera Gala");

    let matched = store.upcoming_events(Some("  hall ")).await.unwrap();
    assert_eq!(matched.len(), 2);

    assert!(store.upcoming_events(Some("nothing")).await.unwrap().is_empty());
}
