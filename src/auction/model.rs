// region:    --- Imports
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Auction

/// Length of the purchase window granted to a winner after auction end.
pub const PURCHASE_WINDOW_DAYS: i64 = 7;

// Auction model. Prices are minor units (cents).
// There is no stored status column: state is derived from the clock at the
// point of use, so stored state can never drift from wall-clock reality.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub gem_type: String,
    pub description: String,
    pub image_ref: Option<String>,
    pub base_price: i64,
    pub current_price: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Time-derived auction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuctionState {
    Upcoming,
    Live,
    Ended,
}

impl Auction {
    /// Derive the lifecycle state at `now`. Never cache the result across a
    /// request boundary.
    pub fn state_at(&self, now: DateTime<Utc>) -> AuctionState {
        if now < self.start_time {
            AuctionState::Upcoming
        } else if now < self.end_time {
            AuctionState::Live
        } else {
            AuctionState::Ended
        }
    }

    /// Deadline by which the winner must complete the purchase.
    pub fn purchase_deadline(&self) -> DateTime<Utc> {
        self.end_time + Duration::days(PURCHASE_WINDOW_DAYS)
    }
}

// endregion: --- Auction

// region:    --- Bid

// Bid model. Ledger entries are append-only and immutable once committed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub bid_time: DateTime<Utc>,
}

// endregion: --- Bid

// region:    --- Winner

/// Purchase obligation status of a winner record.
/// `Pending` is the only non-terminal state; no transition re-enters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PurchaseStatus {
    Pending,
    Paid,
    Expired,
    Canceled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "PENDING",
            PurchaseStatus::Paid => "PAID",
            PurchaseStatus::Expired => "EXPIRED",
            PurchaseStatus::Canceled => "CANCELED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PurchaseStatus::Pending),
            "PAID" => Some(PurchaseStatus::Paid),
            "EXPIRED" => Some(PurchaseStatus::Expired),
            "CANCELED" => Some(PurchaseStatus::Canceled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PurchaseStatus::Pending)
    }
}

// Winner model. At most one record per auction, never deleted; serves as the
// permanent settlement audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Winner {
    pub id: i64,
    pub auction_id: i64,
    pub winner_id: i64,
    pub winning_bid: i64,
    pub ended_at: DateTime<Utc>,
    pub purchase_deadline: DateTime<Utc>,
    pub purchase_status: PurchaseStatus,
    pub payment_id: Option<String>,
    pub purchased_at: Option<DateTime<Utc>>,
}

// endregion: --- Winner

// region:    --- Commands Data

/// Fields a seller supplies when listing a gem for auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub seller_id: i64,
    pub title: String,
    pub gem_type: String,
    pub description: String,
    pub image_ref: Option<String>,
    pub base_price: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Fields a seller may change while the auction is still upcoming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionEdit {
    pub title: Option<String>,
    pub gem_type: Option<String>,
    pub description: Option<String>,
    pub image_ref: Option<String>,
    pub base_price: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

// endregion: --- Commands Data

// region:    --- Tests


// endregion: --- Tests
