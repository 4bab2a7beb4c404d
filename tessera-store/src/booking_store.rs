use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use tessera_booking::models::{Booking, BookingStatus, Event};
use tessera_booking::store::{BookingStore, StoreError};

/// SQLite-backed implementation of [`BookingStore`].
pub struct SqliteBookingStore {
    pool: SqlitePool,
}

impl SqliteBookingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: String,
    location: String,
    event_date: DateTime<Utc>,
    capacity: i64,
    available_seats: i64,
    price_cents: i64,
    image_url: Option<String>,
    organizer_id: String,
    created_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> Result<Event, StoreError> {
        Ok(Event {
            id: parse_uuid(&self.id)?,
            title: self.title,
            description: self.description,
            location: self.location,
            event_date: self.event_date,
            capacity: self.capacity,
            available_seats: self.available_seats,
            price_cents: self.price_cents,
            image_url: self.image_url,
            organizer_id: self.organizer_id,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: String,
    event_id: String,
    user_id: String,
    seats: i64,
    total_cents: i64,
    status: String,
    booked_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, StoreError> {
        let status = BookingStatus::parse(&self.status).ok_or_else(|| {
            StoreError::Backend(format!("unknown booking status: {}", self.status).into())
        })?;
        Ok(Booking {
            id: parse_uuid(&self.id)?,
            event_id: parse_uuid(&self.event_id)?,
            user_id: self.user_id,
            seats: self.seats,
            total_cents: self.total_cents,
            status,
            booked_at: self.booked_at,
        })
    }
}

const EVENT_COLUMNS: &str = "id, title, description, location, event_date, capacity, \
                             available_seats, price_cents, image_url, organizer_id, created_at";

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn create_event(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO events (id, title, description, location, event_date, capacity, \
             available_seats, price_cents, image_url, organizer_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(event.id.to_string())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.event_date)
        .bind(event.capacity)
        .bind(event.available_seats)
        .bind(event.price_cents)
        .bind(&event.image_url)
        .bind(&event.organizer_id)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        debug!(event_id = %event.id, "event created");
        Ok(())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let row: Option<EventRow> =
            sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;

        row.map(EventRow::into_event).transpose()
    }

    async fn upcoming_events(&self, term: Option<&str>) -> Result<Vec<Event>, StoreError> {
        let today = Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();

        let rows: Vec<EventRow> = match term.map(str::trim).filter(|term| !term.is_empty()) {
            Some(term) => {
                let pattern = format!("%{}%", term);
                sqlx::query_as(&format!(
                    "SELECT {EVENT_COLUMNS} FROM events \
                     WHERE event_date >= ?1 \
                       AND (title LIKE ?2 OR description LIKE ?2 OR location LIKE ?2) \
                     ORDER BY event_date"
                ))
                .bind(today)
                .bind(pattern)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE event_date >= ?1 ORDER BY event_date"
                ))
                .bind(today)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)?
            }
        };

        rows.into_iter().map(EventRow::into_event).collect()
    }

    async fn book_seats(
        &self,
        event_id: Uuid,
        user_id: &str,
        seats: i64,
    ) -> Result<Booking, StoreError> {
        let id = event_id.to_string();
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // The guarded decrement is the first statement of the transaction:
        // the capacity check and the write happen under one write lock on
        // the event row. Reading the counter first and deciding outside
        // the transaction is the oversell race.
        let claimed = sqlx::query(
            "UPDATE events SET available_seats = available_seats - ?1 \
             WHERE id = ?2 AND available_seats >= ?1",
        )
        .bind(seats)
        .bind(&id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        if claimed.rows_affected() == 0 {
            // Distinguish a missing event from an exhausted one; the
            // transaction is dropped unchanged either way.
            let available: Option<i64> =
                sqlx::query_scalar("SELECT available_seats FROM events WHERE id = ?1")
                    .bind(&id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(map_sqlx)?;

            return match available {
                None => Err(StoreError::EventNotFound(event_id)),
                Some(available) => Err(StoreError::InsufficientSeats {
                    requested: seats,
                    available,
                }),
            };
        }

        // Price snapshot from the same transaction that took the seats.
        let price_cents: i64 = sqlx::query_scalar("SELECT price_cents FROM events WHERE id = ?1")
            .bind(&id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        let booking = Booking::confirmed(event_id, user_id.to_string(), seats, price_cents);

        sqlx::query(
            "INSERT INTO bookings (id, event_id, user_id, seats, total_cents, status, booked_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(booking.id.to_string())
        .bind(&id)
        .bind(&booking.user_id)
        .bind(booking.seats)
        .bind(booking.total_cents)
        .bind(booking.status.as_str())
        .bind(booking.booked_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;

        debug!(event_id = %event_id, seats, booking_id = %booking.id, "seats claimed");
        Ok(booking)
    }

    async fn release_seats(&self, event_id: Uuid, seats: i64) -> Result<(), StoreError> {
        let id = event_id.to_string();

        let released = sqlx::query(
            "UPDATE events SET available_seats = available_seats + ?1 \
             WHERE id = ?2 AND available_seats + ?1 <= capacity",
        )
        .bind(seats)
        .bind(&id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if released.rows_affected() == 0 {
            let counters: Option<(i64, i64)> =
                sqlx::query_as("SELECT available_seats, capacity FROM events WHERE id = ?1")
                    .bind(&id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(map_sqlx)?;

            return match counters {
                None => Err(StoreError::EventNotFound(event_id)),
                Some((available, capacity)) => Err(StoreError::ReleaseExceedsCapacity {
                    returned: seats,
                    available,
                    capacity,
                }),
            };
        }

        Ok(())
    }

    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<(Booking, Event)>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            "SELECT id, event_id, user_id, seats, total_cents, status, booked_at \
             FROM bookings WHERE user_id = ?1 ORDER BY booked_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let booking = row.into_booking()?;
            if let Some(event) = self.find_event(booking.event_id).await? {
                results.push((booking, event));
            }
        }
        Ok(results)
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Backend(Box::new(e)))
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if is_busy(&e) {
        StoreError::Contention
    } else {
        StoreError::Backend(Box::new(e))
    }
}

/// SQLITE_BUSY / SQLITE_LOCKED and their extended codes: a writer could
/// not take the lock within the busy timeout.
fn is_busy(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("5" | "6" | "261" | "517"))
        }
        _ => false,
    }
}
