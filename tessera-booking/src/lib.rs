pub mod ledger;
pub mod models;
pub mod store;

pub use ledger::{BookingLedger, BookingOutcome, LedgerError, RejectReason};
pub use models::{Booking, BookingStatus, Event};
pub use store::{BookingStore, StoreError};
