/// Error taxonomy for the settlement core.
/// Every variant carries a stable client code so callers can branch on it.
// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- CoreError

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("auction not found")]
    UnknownAuction,

    #[error("auction is not live")]
    AuctionNotLive,

    #[error("bid amount must be a positive amount")]
    InvalidAmount,

    /// The conditional write lost the race (or the validation read was
    /// already behind). Carries the live price so the caller can retry
    /// with a corrected minimum.
    #[error("bid is below the current price of {current_price}")]
    StaleBid { current_price: i64 },

    #[error("auction can only be edited or deleted while upcoming")]
    AuctionNotEditable,

    #[error("invalid auction: {reason}")]
    InvalidAuction { reason: String },

    #[error("winner record not found")]
    UnknownWinner,

    #[error("requester is not the winner of this auction")]
    NotYourWin,

    #[error("the purchase window has closed")]
    WindowExpired,

    #[error("the win has already been purchased")]
    AlreadyPurchased,

    /// Reconciliation mismatch: the winner record left `pending` before the
    /// payment confirmation arrived. Requires manual resolution, not retry.
    #[error("winner is no longer pending")]
    NotPending,

    #[error("checkout hand-off failed: {0}")]
    Checkout(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CoreError {
    /// Stable machine-readable code, exposed in every error response body.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::UnknownAuction => "UNKNOWN_AUCTION",
            CoreError::AuctionNotLive => "NOT_LIVE",
            CoreError::InvalidAmount => "INVALID_AMOUNT",
            CoreError::StaleBid { .. } => "STALE_BID",
            CoreError::AuctionNotEditable => "NOT_EDITABLE",
            CoreError::InvalidAuction { .. } => "INVALID_AUCTION",
            CoreError::UnknownWinner => "UNKNOWN_WINNER",
            CoreError::NotYourWin => "NOT_YOUR_WIN",
            CoreError::WindowExpired => "WINDOW_EXPIRED",
            CoreError::AlreadyPurchased => "ALREADY_PURCHASED",
            CoreError::NotPending => "NOT_PENDING",
            CoreError::Checkout(_) => "CHECKOUT_FAILED",
            CoreError::Database(_) => "DATABASE_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            CoreError::UnknownAuction | CoreError::UnknownWinner => StatusCode::NOT_FOUND,
            // Retryable: the caller re-reads the price and resubmits.
            CoreError::StaleBid { .. } => StatusCode::CONFLICT,
            CoreError::NotYourWin => StatusCode::FORBIDDEN,
            CoreError::AuctionNotLive
            | CoreError::InvalidAmount
            | CoreError::AuctionNotEditable
            | CoreError::InvalidAuction { .. }
            | CoreError::WindowExpired
            | CoreError::AlreadyPurchased => StatusCode::BAD_REQUEST,
            CoreError::NotPending => StatusCode::CONFLICT,
            CoreError::Checkout(_) => StatusCode::BAD_GATEWAY,
            CoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        // A rejected bid must report the live price for the client retry loop.
        if let CoreError::StaleBid { current_price } = &self {
            body["current_price"] = serde_json::json!(current_price);
        }
        (self.status(), Json(body)).into_response()
    }
}

// endregion: --- CoreError

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_bid_reports_current_price() {
        let err = CoreError::StaleBid { current_price: 150 };
        assert_eq!(err.code(), "STALE_BID");
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unknowns_are_not_found() {
        assert_eq!(CoreError::UnknownAuction.status(), StatusCode::NOT_FOUND);
        assert_eq!(CoreError::UnknownWinner.status(), StatusCode::NOT_FOUND);
    }
}

// endregion: --- Tests
