use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use tessera_booking::models::Event;
use tessera_core::url_guard;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/events", get(list_events).post(create_event))
        .route("/v1/events/{id}", get(event_details))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    term: Option<String>,
}

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let mut events = state.store.upcoming_events(query.term.as_deref()).await?;
    for event in &mut events {
        scrub_image_url(event);
    }
    Ok(Json(events))
}

async fn event_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, AppError> {
    let mut event = state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event {id} not found")))?;
    scrub_image_url(&mut event);
    Ok(Json(event))
}

#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    title: String,
    description: String,
    location: String,
    event_date: DateTime<Utc>,
    capacity: i64,
    price_cents: i64,
    image_url: Option<String>,
}

async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let organizer_id = crate::require_user_id(&headers)?;

    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }
    if req.capacity <= 0 {
        return Err(AppError::BadRequest(
            "capacity must be a positive integer".to_string(),
        ));
    }
    if req.price_cents < 0 {
        return Err(AppError::BadRequest(
            "price must not be negative".to_string(),
        ));
    }

    let event = Event::new(
        req.title,
        req.description,
        req.location,
        req.event_date,
        req.capacity,
        req.price_cents,
        req.image_url,
        organizer_id,
    );
    state.store.create_event(&event).await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// A stored image link that fails the safety check is dropped rather than
/// handed to a browser.
pub(crate) fn scrub_image_url(event: &mut Event) {
    if let Some(url) = &event.image_url {
        if !url_guard::is_safe_external_url(url) {
            event.image_url = None;
        }
    }
}
