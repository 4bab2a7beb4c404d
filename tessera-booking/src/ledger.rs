use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Booking;
use crate::store::{BookingStore, StoreError};

/// Why a booking request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidSeatCount,
    EventNotFound,
    NotEnoughSeats,
}

impl RejectReason {
    /// User-facing message for the rejection.
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::InvalidSeatCount => "Please select at least one seat.",
            RejectReason::EventNotFound => "The selected event could not be found.",
            RejectReason::NotEnoughSeats => "Not enough seats remaining for this event.",
        }
    }
}

/// Outcome of a booking attempt. Rejections are expected results the
/// caller turns into a message, not errors.
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Confirmed(Booking),
    Rejected(RejectReason),
}

impl BookingOutcome {
    pub fn success(&self) -> bool {
        matches!(self, BookingOutcome::Confirmed(_))
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            BookingOutcome::Confirmed(_) => None,
            BookingOutcome::Rejected(reason) => Some(reason.message()),
        }
    }
}

/// Failures the caller cannot phrase as a seat message: the store stayed
/// contended past the retry budget, or the backend failed outright.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("booking transaction still contended after {attempts} attempts")]
    Contended { attempts: u32 },

    #[error("storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Seat-inventory ledger: converts booking requests into an atomic
/// seat-count decrement plus a confirmed booking row, or an explicit
/// rejection, never a partial mutation.
pub struct BookingLedger {
    store: Arc<dyn BookingStore>,
    max_conflict_retries: u32,
}

impl BookingLedger {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self {
            store,
            max_conflict_retries: 3,
        }
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Book `seats` on `event_id` for `user_id`.
    ///
    /// The capacity check and the decrement happen inside one storage
    /// transaction per attempt, so concurrent requests against the same
    /// event can never jointly oversell it. Contention is retried up to
    /// the configured budget and then surfaced as [`LedgerError::Contended`],
    /// never as a seat shortage.
    pub async fn book(
        &self,
        event_id: Uuid,
        user_id: &str,
        seats: i64,
    ) -> Result<BookingOutcome, LedgerError> {
        if seats <= 0 {
            return Ok(BookingOutcome::Rejected(RejectReason::InvalidSeatCount));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.store.book_seats(event_id, user_id, seats).await {
                Ok(booking) => {
                    info!(%event_id, user_id, seats, booking_id = %booking.id, "booking confirmed");
                    return Ok(BookingOutcome::Confirmed(booking));
                }
                Err(StoreError::EventNotFound(_)) => {
                    return Ok(BookingOutcome::Rejected(RejectReason::EventNotFound));
                }
                Err(StoreError::InsufficientSeats { requested, available }) => {
                    info!(%event_id, requested, available, "booking rejected, not enough seats");
                    return Ok(BookingOutcome::Rejected(RejectReason::NotEnoughSeats));
                }
                Err(StoreError::Contention) if attempts <= self.max_conflict_retries => {
                    warn!(%event_id, attempts, "booking transaction contended, retrying");
                }
                Err(StoreError::Contention) => {
                    return Err(LedgerError::Contended { attempts });
                }
                Err(StoreError::Backend(source)) => {
                    return Err(LedgerError::Storage(source));
                }
                Err(other) => {
                    return Err(LedgerError::Storage(Box::new(other)));
                }
            }
        }
    }
}
