/// Payment reconciliation adapter.
/// Translates the external payment service's asynchronous confirmation into
/// the one legal status transition, `pending -> paid`. A confirmation that
/// arrives after the win left pending is a reconciliation mismatch for
/// manual review, never a blind retry.
// region:    --- Imports
use crate::auction::model::{PurchaseStatus, Winner};
use crate::error::CoreError;
use crate::store::{AuctionStore, StatusTransition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Payment Confirmation

/// Payload of the payment service's confirmation webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub winner_id: i64,
    pub payment_id: String,
}

/// Apply a confirmed payment: `pending -> paid`, recording the payment id
/// and the confirmation instant. Conditional on the record still being
/// pending at write time.
pub async fn on_payment_confirmed(
    confirmation: PaymentConfirmation,
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> Result<Winner, CoreError> {
    info!(
        "{:<12} --> payment confirmed: winner={} payment={}",
        "Payment", confirmation.winner_id, confirmation.payment_id
    );

    match store
        .set_winner_status_if_pending(
            confirmation.winner_id,
            PurchaseStatus::Paid,
            Some(confirmation.payment_id.clone()),
            now,
        )
        .await?
    {
        StatusTransition::Applied(winner) => Ok(winner),
        StatusTransition::NotPending(status) => {
            // Late confirmation against an expired/canceled/paid win: a
            // refund or goodwill decision, outside this core.
            warn!(
                "{:<12} --> reconciliation mismatch, win is {:?}: winner={} payment={}",
                "Payment", status, confirmation.winner_id, confirmation.payment_id
            );
            Err(CoreError::NotPending)
        }
    }
}

// endregion: --- Payment Confirmation

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::NewWinner;
    use chrono::Duration;

    async fn pending_winner(store: &MemoryStore) -> Winner {
        let now = Utc::now();
        store
            .insert_winner(NewWinner {
                auction_id: 1,
                winner_id: 42,
                winning_bid: 500,
                ended_at: now - Duration::days(1),
                purchase_deadline: now + Duration::days(6),
            })
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn confirmation_marks_a_pending_win_paid() {
        let store = MemoryStore::new();
        let winner = pending_winner(&store).await;
        let now = Utc::now();

        let paid = on_payment_confirmed(
            PaymentConfirmation {
                winner_id: winner.id,
                payment_id: "pay_901".into(),
            },
            &store,
            now,
        )
        .await
        .unwrap();

        assert_eq!(paid.purchase_status, PurchaseStatus::Paid);
        assert_eq!(paid.payment_id.as_deref(), Some("pay_901"));
        assert_eq!(paid.purchased_at, Some(now));
    }

    #[tokio::test]
    async fn duplicate_confirmation_is_a_mismatch() {
        let store = MemoryStore::new();
        let winner = pending_winner(&store).await;
        let now = Utc::now();

        let confirmation = PaymentConfirmation {
            winner_id: winner.id,
            payment_id: "pay_902".into(),
        };
        on_payment_confirmed(confirmation.clone(), &store, now)
            .await
            .unwrap();

        let err = on_payment_confirmed(confirmation, &store, now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotPending));

        // The first payment id sticks.
        let after = store.get_winner(winner.id).await.unwrap().unwrap();
        assert_eq!(after.payment_id.as_deref(), Some("pay_902"));
    }

    #[tokio::test]
    async fn unknown_winner_is_reported() {
        let store = MemoryStore::new();
        let err = on_payment_confirmed(
            PaymentConfirmation {
                winner_id: 999,
                payment_id: "pay_903".into(),
            },
            &store,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::UnknownWinner));
    }
}

// endregion: --- Tests
