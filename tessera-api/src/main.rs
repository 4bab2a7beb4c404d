use std::net::SocketAddr;
use std::sync::Arc;

use tessera_api::{app, AppState};
use tessera_booking::store::BookingStore;
use tessera_booking::BookingLedger;
use tessera_store::{app_config::Config, DbClient, SqliteBookingStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Tessera API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to database");
    db.migrate().await.expect("Failed to run migrations");

    let store: Arc<dyn BookingStore> = Arc::new(SqliteBookingStore::new(db.pool.clone()));
    let ledger = Arc::new(
        BookingLedger::new(store.clone())
            .with_conflict_retries(config.booking.max_conflict_retries),
    );

    let state = AppState {
        store,
        ledger,
        fallback_redirect: config.booking.fallback_redirect.clone(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app(state)).await.unwrap();
}
