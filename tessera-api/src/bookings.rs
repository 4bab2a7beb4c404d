use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_booking::models::{Booking, Event};
use tessera_booking::BookingOutcome;

use crate::error::AppError;
use crate::events::scrub_image_url;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/events/{id}/bookings", post(book_event))
        .route("/v1/bookings", get(my_bookings))
}

#[derive(Debug, Deserialize)]
struct BookRequest {
    seats: i64,
}

/// Business rejections ride in the body with `success: false`; the HTTP
/// status stays 200 because running out of seats is a normal outcome, not
/// a protocol failure.
#[derive(Debug, Serialize)]
struct BookResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    booking: Option<Booking>,
}

async fn book_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, AppError> {
    let user_id = crate::require_user_id(&headers)?;

    let outcome = state.ledger.book(id, &user_id, req.seats).await?;

    Ok(Json(match outcome {
        BookingOutcome::Confirmed(booking) => BookResponse {
            success: true,
            error: None,
            booking: Some(booking),
        },
        BookingOutcome::Rejected(reason) => BookResponse {
            success: false,
            error: Some(reason.message().to_string()),
            booking: None,
        },
    }))
}

#[derive(Debug, Serialize)]
struct BookingEntry {
    booking: Booking,
    event: Event,
}

async fn my_bookings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingEntry>>, AppError> {
    let user_id = crate::require_user_id(&headers)?;

    let rows = state.store.bookings_for_user(&user_id).await?;
    let entries = rows
        .into_iter()
        .map(|(booking, mut event)| {
            scrub_image_url(&mut event);
            BookingEntry { booking, event }
        })
        .collect();

    Ok(Json(entries))
}
