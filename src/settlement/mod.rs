/// Winner settlement service.
/// An ended auction with at least one bid gets exactly one winner record;
/// the uniqueness constraint on `auction_id` is the idempotency key, so any
/// number of racing settlement attempts produce one record. Zero-bid
/// auctions are skipped, never retried as errors.
// region:    --- Imports
use crate::auction::model::{AuctionState, Winner};
use crate::error::CoreError;
use crate::store::{AuctionStore, NewWinner};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Settlement

/// Outcome of one settlement attempt.
#[derive(Debug, Clone)]
pub enum Settlement {
    Created(Winner),
    /// The auction ended without bids; no record is created.
    NoBids,
    /// A winner record already exists. Idempotent no-op.
    AlreadySettled,
}

/// Settle one ended auction. The winner is the bidder holding the final
/// `current_price`, i.e. the most recent committed bid; ties are impossible
/// because the conditional write forbids two bids settling at one amount.
pub async fn settle_auction(
    auction_id: i64,
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> Result<Settlement, CoreError> {
    let auction = store
        .get_auction(auction_id)
        .await?
        .ok_or(CoreError::UnknownAuction)?;

    if auction.state_at(now) != AuctionState::Ended {
        return Err(CoreError::InvalidAuction {
            reason: "auction has not ended".into(),
        });
    }

    let final_bid = match store.final_bid(auction_id).await? {
        Some(bid) => bid,
        None => {
            debug!("{:<12} --> no bids, skipping: auction={}", "Settle", auction_id);
            return Ok(Settlement::NoBids);
        }
    };

    // The deadline is computed once here and never recomputed.
    let winner = NewWinner {
        auction_id,
        winner_id: final_bid.bidder_id,
        winning_bid: final_bid.amount,
        ended_at: auction.end_time,
        purchase_deadline: auction.purchase_deadline(),
    };

    match store.insert_winner(winner).await? {
        Some(created) => {
            info!(
                "{:<12} --> winner created: auction={} winner={} bid={}",
                "Settle", auction_id, created.winner_id, created.winning_bid
            );
            Ok(Settlement::Created(created))
        }
        // Lost the insert race to another sweep; not an error.
        None => {
            debug!(
                "{:<12} --> already settled: auction={}",
                "Settle", auction_id
            );
            Ok(Settlement::AlreadySettled)
        }
    }
}

/// One pass of the settlement sweep: settle every auction whose derived
/// state is ended and which has no winner record yet. Skips are routine;
/// only storage failures propagate.
pub async fn run_settlement_sweep(
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> Result<u64, CoreError> {
    let ended = store.ended_unsettled(now).await?;
    let mut created = 0;
    for auction in ended {
        match settle_auction(auction.id, store, now).await {
            Ok(Settlement::Created(_)) => created += 1,
            Ok(Settlement::NoBids) | Ok(Settlement::AlreadySettled) => {}
            Err(e) => {
                warn!(
                    "{:<12} --> settlement failed: auction={} err={:?}",
                    "Settle", auction.id, e
                );
            }
        }
    }
    if created > 0 {
        info!("{:<12} --> settlement sweep created {} winner(s)", "Settle", created);
    }
    Ok(created)
}

// endregion: --- Settlement

// region:    --- Tests


// endregion: --- Tests
