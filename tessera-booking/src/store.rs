use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Booking, Event};

/// Persistence seam the booking ledger drives.
///
/// `book_seats` is the one operation with a concurrency contract: the
/// capacity check and the decrement must execute as a single atomic step
/// scoped to the event row, so concurrent claims against the same event
/// serialize while claims against different events proceed in parallel.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create_event(&self, event: &Event) -> Result<(), StoreError>;

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    /// Events dated today or later, optionally filtered by a substring
    /// match over title, description and location, ordered by date.
    async fn upcoming_events(&self, term: Option<&str>) -> Result<Vec<Event>, StoreError>;

    /// Atomically claim `seats` on the event and record a confirmed
    /// booking with the price captured in the same transaction. Either
    /// both changes commit or neither does.
    async fn book_seats(
        &self,
        event_id: Uuid,
        user_id: &str,
        seats: i64,
    ) -> Result<Booking, StoreError>;

    /// Return previously claimed seats. The counter can never be pushed
    /// past the event's capacity; a future cancellation flow calls this.
    async fn release_seats(&self, event_id: Uuid, seats: i64) -> Result<(), StoreError>;

    /// A user's bookings paired with their events, newest first.
    async fn bookings_for_user(&self, user_id: &str) -> Result<Vec<(Booking, Event)>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("event not found: {0}")]
    EventNotFound(Uuid),

    #[error("not enough seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: i64, available: i64 },

    #[error("release of {returned} seats would exceed capacity {capacity} (available {available})")]
    ReleaseExceedsCapacity {
        returned: i64,
        available: i64,
        capacity: i64,
    },

    /// The event row stayed write-locked past the busy timeout. Transient;
    /// distinct from running out of seats.
    #[error("storage contention on event row")]
    Contention,

    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}
