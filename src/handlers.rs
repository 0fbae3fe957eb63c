// region:    --- Imports
use crate::auction::commands::{
    handle_create_auction, handle_delete_auction, handle_edit_auction,
};
use crate::auction::model::{AuctionEdit, NewAuction};
use crate::bidding::commands::{handle_place_bid, PlaceBidCommand};
use crate::checkout::CheckoutGateway;
use crate::error::CoreError;
use crate::payment::{on_payment_confirmed, PaymentConfirmation};
use crate::purchase::{cancel_win, initiate_purchase};
use crate::store::AuctionStore;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- App State

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuctionStore>,
    pub checkout: Arc<dyn CheckoutGateway>,
}

// endregion: --- App State

// region:    --- Command Handlers

/// Place a bid.
pub async fn handle_bid(
    State(state): State<AppState>,
    Json(cmd): Json<PlaceBidCommand>,
) -> Result<impl IntoResponse, CoreError> {
    let bid = handle_place_bid(cmd, state.store.as_ref(), Utc::now()).await?;
    Ok(Json(serde_json::json!({
        "message": "bid accepted",
        "current_price": bid.amount,
        "bid": bid,
    })))
}

/// Create an auction listing.
pub async fn handle_create(
    State(state): State<AppState>,
    Json(cmd): Json<NewAuction>,
) -> Result<impl IntoResponse, CoreError> {
    let auction = handle_create_auction(cmd, state.store.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(auction)))
}

/// Edit an upcoming auction.
pub async fn handle_edit(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Json(edit): Json<AuctionEdit>,
) -> Result<impl IntoResponse, CoreError> {
    let auction = handle_edit_auction(auction_id, edit, state.store.as_ref(), Utc::now()).await?;
    Ok(Json(auction))
}

/// Delete an upcoming auction.
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, CoreError> {
    handle_delete_auction(auction_id, state.store.as_ref(), Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct InitiatePurchaseRequest {
    pub requester_id: i64,
}

/// Initiate the purchase of a win inside its window.
pub async fn handle_initiate_purchase(
    State(state): State<AppState>,
    Path(winner_id): Path<i64>,
    Json(req): Json<InitiatePurchaseRequest>,
) -> Result<impl IntoResponse, CoreError> {
    let initiated = initiate_purchase(
        winner_id,
        req.requester_id,
        state.store.as_ref(),
        state.checkout.as_ref(),
        Utc::now(),
    )
    .await?;
    Ok(Json(initiated))
}

/// Administrative cancel of a pending win.
pub async fn handle_cancel_win(
    State(state): State<AppState>,
    Path(winner_id): Path<i64>,
) -> Result<impl IntoResponse, CoreError> {
    let winner = cancel_win(winner_id, state.store.as_ref(), Utc::now()).await?;
    Ok(Json(winner))
}

/// Payment service webhook.
pub async fn handle_payment_confirmed(
    State(state): State<AppState>,
    Json(confirmation): Json<PaymentConfirmation>,
) -> Result<impl IntoResponse, CoreError> {
    let winner = on_payment_confirmed(confirmation, state.store.as_ref(), Utc::now()).await?;
    Ok(Json(winner))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// Read projection of one auction: the record plus its derived state.
pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, CoreError> {
    info!("{:<12} --> get auction id: {}", "HandlerQuery", auction_id);
    let now = Utc::now();
    let auction = state
        .store
        .get_auction(auction_id)
        .await?
        .ok_or(CoreError::UnknownAuction)?;
    let auction_state = auction.state_at(now);
    Ok(Json(serde_json::json!({
        "auction": auction,
        "state": auction_state,
    })))
}

/// All auction listings.
pub async fn handle_list_auctions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, CoreError> {
    info!("{:<12} --> list auctions", "HandlerQuery");
    let auctions = state.store.list_auctions().await?;
    Ok(Json(auctions))
}

/// Bid history of one auction, most recent first.
pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, CoreError> {
    info!("{:<12} --> bid history id: {}", "HandlerQuery", auction_id);
    // An unknown auction is a 404, not an empty ledger.
    state
        .store
        .get_auction(auction_id)
        .await?
        .ok_or(CoreError::UnknownAuction)?;
    let bids = state.store.bid_history(auction_id).await?;
    Ok(Json(bids))
}

/// Winner projection of one auction (purchase status, deadline).
pub async fn handle_get_auction_winner(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> Result<impl IntoResponse, CoreError> {
    info!("{:<12} --> auction winner id: {}", "HandlerQuery", auction_id);
    let winner = state
        .store
        .winner_for_auction(auction_id)
        .await?
        .ok_or(CoreError::UnknownWinner)?;
    Ok(Json(winner))
}

/// One winner record by id.
pub async fn handle_get_winner(
    State(state): State<AppState>,
    Path(winner_id): Path<i64>,
) -> Result<impl IntoResponse, CoreError> {
    info!("{:<12} --> get winner id: {}", "HandlerQuery", winner_id);
    let winner = state
        .store
        .get_winner(winner_id)
        .await?
        .ok_or(CoreError::UnknownWinner)?;
    Ok(Json(winner))
}

// endregion: --- Query Handlers

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::NewAuction;
    use crate::checkout::NoopCheckout;
    use crate::store::memory::MemoryStore;
    use chrono::Duration;

    fn state() -> AppState {
        AppState {
            store: Arc::new(MemoryStore::new()),
            checkout: Arc::new(NoopCheckout),
        }
    }

    #[tokio::test]
    async fn bid_history_of_unknown_auction_is_not_found() {
        match handle_get_bid_history(State(state()), Path(99)).await {
            Err(CoreError::UnknownAuction) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected UnknownAuction for a missing auction"),
        }
    }

    #[tokio::test]
    async fn bid_history_of_a_bidless_auction_is_empty_not_missing() {
        let state = state();
        let now = Utc::now();
        let auction = state
            .store
            .insert_auction(NewAuction {
                seller_id: 1,
                title: "Tsavorite".into(),
                gem_type: "garnet".into(),
                description: "2.7ct".into(),
                image_ref: None,
                base_price: 100,
                start_time: now - Duration::hours(1),
                end_time: now + Duration::hours(1),
            })
            .await
            .unwrap();

        assert!(handle_get_bid_history(State(state.clone()), Path(auction.id))
            .await
            .is_ok());
    }
}

// endregion: --- Tests
