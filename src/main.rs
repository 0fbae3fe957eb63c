// region:    --- Imports
use crate::checkout::HttpCheckout;
use crate::database::DatabaseManager;
use crate::handlers::AppState;
use crate::scheduler::SweepScheduler;
use crate::store::postgres::PostgresStore;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod checkout;
mod database;
mod error;
mod handlers;
mod payment;
mod purchase;
mod scheduler;
mod settlement;
mod store;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let db_manager = DatabaseManager::new().await?;
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> schema bootstrap failed: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> schema bootstrap done", "Main");

    let store: Arc<dyn store::AuctionStore> =
        Arc::new(PostgresStore::new(db_manager.get_pool()));

    let order_service_url =
        std::env::var("ORDER_SERVICE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string());
    let state = AppState {
        store: Arc::clone(&store),
        checkout: Arc::new(HttpCheckout::new(order_service_url)),
    };

    // Settlement and expiry sweeps; every mutation they make is conditional,
    // so overlapping with request handling is safe.
    let sweep_interval = std::env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);
    let scheduler = SweepScheduler::new(
        Arc::clone(&store),
        tokio::time::Duration::from_secs(sweep_interval),
    );
    scheduler.start();
    info!(
        "{:<12} --> sweeps running every {}s",
        "Main", sweep_interval
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes_all = Router::new()
        .route("/bid", post(handlers::handle_bid))
        .route(
            "/auctions",
            post(handlers::handle_create).get(handlers::handle_list_auctions),
        )
        .route(
            "/auctions/:id",
            get(handlers::handle_get_auction)
                .put(handlers::handle_edit)
                .delete(handlers::handle_delete),
        )
        .route("/auctions/:id/bids", get(handlers::handle_get_bid_history))
        .route(
            "/auctions/:id/winner",
            get(handlers::handle_get_auction_winner),
        )
        .route("/winners/:id", get(handlers::handle_get_winner))
        .route(
            "/winners/:id/purchase",
            post(handlers::handle_initiate_purchase),
        )
        .route("/winners/:id/cancel", post(handlers::handle_cancel_win))
        .route("/payments/confirm", post(handlers::handle_payment_confirmed))
        .layer(cors)
        .with_state(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
