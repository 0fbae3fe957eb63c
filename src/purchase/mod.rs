/// Purchase window enforcer.
/// Two idempotent responsibilities: expire pending winners past their
/// deadline, and validate purchase initiation inside the window. Initiation
/// hands off to the checkout collaborator and leaves the status pending;
/// only a payment confirmation marks a win paid.
// region:    --- Imports
use crate::auction::model::{PurchaseStatus, Winner};
use crate::checkout::CheckoutGateway;
use crate::error::CoreError;
use crate::store::{AuctionStore, StatusTransition};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Expiry Sweep

/// One pass of the expiry sweep. The store write is conditioned on the
/// status still being pending, so a payment confirmation landing
/// concurrently cannot be clobbered.
pub async fn run_expiry_sweep(
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> Result<u64, CoreError> {
    let expired = store.expire_overdue_winners(now).await?;
    if expired > 0 {
        info!("{:<12} --> expired {} overdue win(s)", "Purchase", expired);
    }
    Ok(expired)
}

// endregion: --- Expiry Sweep

// region:    --- Purchase Initiation

/// A successful initiation: the external order reference plus the still
/// pending winner record.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseInitiated {
    pub order_ref: String,
    pub winner: Winner,
}

/// Initiate the purchase of a win. Requires the requester to be the winner,
/// the status to be pending, and the deadline not to have passed. A pending
/// win observed past its deadline is expired on the spot rather than waiting
/// for the sweep.
pub async fn initiate_purchase(
    winner_id: i64,
    requester_id: i64,
    store: &dyn AuctionStore,
    checkout: &dyn CheckoutGateway,
    now: DateTime<Utc>,
) -> Result<PurchaseInitiated, CoreError> {
    info!(
        "{:<12} --> initiate purchase: winner={} requester={}",
        "Purchase", winner_id, requester_id
    );

    let winner = store
        .get_winner(winner_id)
        .await?
        .ok_or(CoreError::UnknownWinner)?;

    if winner.winner_id != requester_id {
        return Err(CoreError::NotYourWin);
    }
    match winner.purchase_status {
        PurchaseStatus::Pending => {}
        PurchaseStatus::Paid => return Err(CoreError::AlreadyPurchased),
        PurchaseStatus::Expired | PurchaseStatus::Canceled => {
            return Err(CoreError::WindowExpired)
        }
    }
    if now >= winner.purchase_deadline {
        // On-demand expiry; the conditional write keeps this idempotent
        // against the sweep running at the same moment.
        store
            .set_winner_status_if_pending(winner_id, PurchaseStatus::Expired, None, now)
            .await?;
        return Err(CoreError::WindowExpired);
    }

    // Hand-off only; the status stays pending until payment confirms.
    let order_ref = checkout.create_order_for_win(winner_id).await?;
    info!(
        "{:<12} --> order opened: winner={} order_ref={}",
        "Purchase", winner_id, order_ref
    );
    Ok(PurchaseInitiated { order_ref, winner })
}

// endregion: --- Purchase Initiation

// region:    --- Administrative Cancel

/// Administrative cancel of a pending win. Terminal states reject with
/// `NotPending`.
pub async fn cancel_win(
    winner_id: i64,
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> Result<Winner, CoreError> {
    info!("{:<12} --> cancel win: winner={}", "Purchase", winner_id);
    match store
        .set_winner_status_if_pending(winner_id, PurchaseStatus::Canceled, None, now)
        .await?
    {
        StatusTransition::Applied(winner) => Ok(winner),
        StatusTransition::NotPending(status) => {
            warn!(
                "{:<12} --> cancel refused, win is {:?}: winner={}",
                "Purchase", status, winner_id
            );
            Err(CoreError::NotPending)
        }
    }
}

// endregion: --- Administrative Cancel

// region:    --- Tests


// endregion: --- Tests
