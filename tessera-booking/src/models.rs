use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// A bookable event with a fixed seat capacity.
///
/// `available_seats` never exceeds `capacity`; it only moves through the
/// booking transaction (down) or a seat release (up).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub capacity: i64,
    pub available_seats: i64,
    /// Ticket price in minor units.
    pub price_cents: i64,
    pub image_url: Option<String>,
    pub organizer_id: String,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event with every seat still available.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        description: String,
        location: String,
        event_date: DateTime<Utc>,
        capacity: i64,
        price_cents: i64,
        image_url: Option<String>,
        organizer_id: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            location,
            event_date,
            capacity,
            available_seats: capacity,
            price_cents,
            image_url,
            organizer_id,
            created_at: Utc::now(),
        }
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_seats == 0
    }
}

/// A confirmed claim on part of an event's capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: String,
    pub seats: i64,
    /// Seats times the event price at booking time. The price is
    /// snapshotted, not recomputed later.
    pub total_cents: i64,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
}

impl Booking {
    /// Build the booking row recorded by a successful transaction.
    pub fn confirmed(event_id: Uuid, user_id: String, seats: i64, price_cents: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            seats,
            total_cents: seats * price_cents,
            status: BookingStatus::Confirmed,
            booked_at: Utc::now(),
        }
    }
}
