/// Persistence port for the settlement core.
/// The trait exposes the conditional primitives the whole system rests on;
/// everything race-sensitive is a single conditional write behind one of
/// these methods.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionEdit, Bid, NewAuction, PurchaseStatus, Winner};
use crate::error::CoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;
pub mod queries;

// endregion: --- Modules

// region:    --- Outcomes

/// Outcome of the conditional bid commit.
#[derive(Debug, Clone)]
pub enum BidCommit {
    /// The conditional price update held; the ledger entry was appended.
    Accepted(Bid),
    /// Lost the race: another bid moved the price first.
    Stale { current_price: i64 },
    /// The auction left its live window between validation and commit.
    Closed,
}

/// Outcome of a conditional `pending -> terminal` winner status write.
#[derive(Debug, Clone)]
pub enum StatusTransition {
    Applied(Winner),
    /// The record had already left `pending`; carries what it is now.
    NotPending(PurchaseStatus),
}

/// Fields for the exactly-once winner insert.
#[derive(Debug, Clone)]
pub struct NewWinner {
    pub auction_id: i64,
    pub winner_id: i64,
    pub winning_bid: i64,
    pub ended_at: DateTime<Utc>,
    pub purchase_deadline: DateTime<Utc>,
}

// endregion: --- Outcomes

// region:    --- AuctionStore

#[async_trait]
pub trait AuctionStore: Send + Sync {
    // -- Auctions
    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, CoreError>;
    async fn get_auction(&self, auction_id: i64) -> Result<Option<Auction>, CoreError>;
    async fn list_auctions(&self) -> Result<Vec<Auction>, CoreError>;
    /// Apply seller edits only while the auction is still upcoming at `now`.
    async fn update_auction_if_upcoming(
        &self,
        auction_id: i64,
        edit: AuctionEdit,
        now: DateTime<Utc>,
    ) -> Result<Auction, CoreError>;
    /// Delete only while still upcoming at `now`.
    async fn delete_auction_if_upcoming(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError>;

    // -- Bid ledger
    /// The race-safety mechanism: set `current_price = amount` only if the
    /// auction is still live at `now` and `current_price < amount`, appending
    /// the ledger entry in the same atomic step.
    async fn commit_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<BidCommit, CoreError>;
    /// Bid history, most recent first.
    async fn bid_history(&self, auction_id: i64) -> Result<Vec<Bid>, CoreError>;
    /// The most recent committed bid, i.e. the holder of `current_price`.
    async fn final_bid(&self, auction_id: i64) -> Result<Option<Bid>, CoreError>;

    // -- Winners
    /// Auctions whose derived state at `now` is ended and which have no
    /// winner record yet. Zero-bid auctions stay in this scan and are
    /// skipped by the settlement sweep.
    async fn ended_unsettled(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, CoreError>;
    /// Exactly-once insert keyed on `auction_id`. Returns `None` when a
    /// record already exists (the uniqueness constraint fired).
    async fn insert_winner(&self, winner: NewWinner) -> Result<Option<Winner>, CoreError>;
    async fn get_winner(&self, winner_id: i64) -> Result<Option<Winner>, CoreError>;
    async fn winner_for_auction(&self, auction_id: i64) -> Result<Option<Winner>, CoreError>;
    /// Expiry sweep: every `pending` winner whose deadline is at or before
    /// `now` becomes `expired`. Returns how many rows changed.
    async fn expire_overdue_winners(&self, now: DateTime<Utc>) -> Result<u64, CoreError>;
    /// Conditional status write: apply `to` (with optional payment details)
    /// only if the record is still `pending`.
    async fn set_winner_status_if_pending(
        &self,
        winner_id: i64,
        to: PurchaseStatus,
        payment_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<StatusTransition, CoreError>;
}

// endregion: --- AuctionStore
