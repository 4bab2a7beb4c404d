use std::sync::Arc;

use tessera_booking::store::BookingStore;
use tessera_booking::BookingLedger;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub ledger: Arc<BookingLedger>,
    /// Where a rejected post-login redirect lands.
    pub fallback_redirect: String,
}
