use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;

use tessera_core::url_guard;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/return", get(login_return))
}

#[derive(Debug, Deserialize)]
struct ReturnQuery {
    return_url: Option<String>,
}

/// The post-login hop. The raw `return_url` never reaches the Location
/// header directly; everything goes through the resolver, which falls
/// back to the configured site root for off-origin targets.
async fn login_return(State(state): State<AppState>, Query(query): Query<ReturnQuery>) -> Redirect {
    let target = url_guard::resolve_safe_redirect(
        query.return_url.as_deref(),
        &state.fallback_redirect,
    );
    Redirect::to(target)
}
