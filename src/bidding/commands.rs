/// Bid acceptance engine.
/// Validation runs in a fixed order, then the commit is one conditional
/// atomic write; losers of a race get `StaleBid` with the fresh price and
/// retry client-side. There is no server-side retry loop and no lock beyond
/// what the store's conditional write provides.
// region:    --- Imports
use crate::auction::model::{AuctionState, Bid};
use crate::error::CoreError;
use crate::store::{AuctionStore, BidCommit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
}

/// Place a bid. Preconditions, in order: the auction exists; it is live;
/// the amount is positive; the amount beats the current price. Raising one's
/// own standing bid follows the identical contract.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> Result<Bid, CoreError> {
    info!("{:<12} --> place bid: {:?}", "Command", cmd);

    let auction = store
        .get_auction(cmd.auction_id)
        .await?
        .ok_or(CoreError::UnknownAuction)?;

    if auction.state_at(now) != AuctionState::Live {
        return Err(CoreError::AuctionNotLive);
    }
    if cmd.amount <= 0 {
        return Err(CoreError::InvalidAmount);
    }
    if cmd.amount <= auction.current_price {
        return Err(CoreError::StaleBid {
            current_price: auction.current_price,
        });
    }

    // The conditional write is the serialization point: under concurrent
    // bidders only the update whose precondition still holds succeeds.
    match store
        .commit_bid(cmd.auction_id, cmd.bidder_id, cmd.amount, now)
        .await?
    {
        BidCommit::Accepted(bid) => {
            info!(
                "{:<12} --> bid accepted: auction={} bidder={} amount={}",
                "Command", bid.auction_id, bid.bidder_id, bid.amount
            );
            Ok(bid)
        }
        BidCommit::Stale { current_price } => {
            warn!(
                "{:<12} --> stale bid: auction={} amount={} current={}",
                "Command", cmd.auction_id, cmd.amount, current_price
            );
            Err(CoreError::StaleBid { current_price })
        }
        BidCommit::Closed => Err(CoreError::AuctionNotLive),
    }
}

// endregion: --- Commands

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::NewAuction;
    use crate::store::memory::MemoryStore;
    use chrono::Duration;

    async fn live_auction(store: &MemoryStore, base_price: i64) -> i64 {
        let now = Utc::now();
        store
            .insert_auction(NewAuction {
                seller_id: 1,
                title: "Padparadscha".into(),
                gem_type: "sapphire".into(),
                description: "2.1ct".into(),
                image_ref: None,
                base_price,
                start_time: now - Duration::hours(1),
                end_time: now + Duration::hours(1),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn accepts_a_bid_above_the_current_price() {
        let store = MemoryStore::new();
        let auction_id = live_auction(&store, 100).await;

        let bid = handle_place_bid(
            PlaceBidCommand {
                auction_id,
                bidder_id: 7,
                amount: 150,
            },
            &store,
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(bid.amount, 150);
        let auction = store.get_auction(auction_id).await.unwrap().unwrap();
        assert_eq!(auction.current_price, 150);
    }

    #[tokio::test]
    async fn rejects_amounts_at_or_below_zero() {
        let store = MemoryStore::new();
        let auction_id = live_auction(&store, 100).await;

        for amount in [0, -5] {
            let err = handle_place_bid(
                PlaceBidCommand {
                    auction_id,
                    bidder_id: 7,
                    amount,
                },
                &store,
                Utc::now(),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, CoreError::InvalidAmount));
        }
    }

    #[tokio::test]
    async fn stale_bid_reports_the_live_price() {
        let store = MemoryStore::new();
        let auction_id = live_auction(&store, 100).await;
        let now = Utc::now();

        handle_place_bid(
            PlaceBidCommand {
                auction_id,
                bidder_id: 1,
                amount: 150,
            },
            &store,
            now,
        )
        .await
        .unwrap();

        let err = handle_place_bid(
            PlaceBidCommand {
                auction_id,
                bidder_id: 2,
                amount: 140,
            },
            &store,
            now,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::StaleBid { current_price: 150 }));
    }

    #[tokio::test]
    async fn rejects_bids_outside_the_live_window() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let upcoming = store
            .insert_auction(NewAuction {
                seller_id: 1,
                title: "Emerald".into(),
                gem_type: "emerald".into(),
                description: "1.4ct".into(),
                image_ref: None,
                base_price: 100,
                start_time: now + Duration::hours(1),
                end_time: now + Duration::hours(2),
            })
            .await
            .unwrap();
        let ended = store
            .insert_auction(NewAuction {
                seller_id: 1,
                title: "Ruby".into(),
                gem_type: "ruby".into(),
                description: "0.9ct".into(),
                image_ref: None,
                base_price: 100,
                start_time: now - Duration::hours(2),
                end_time: now - Duration::hours(1),
            })
            .await
            .unwrap();

        for auction_id in [upcoming.id, ended.id] {
            let err = handle_place_bid(
                PlaceBidCommand {
                    auction_id,
                    bidder_id: 7,
                    amount: 500,
                },
                &store,
                now,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, CoreError::AuctionNotLive));
        }
    }

    #[tokio::test]
    async fn own_bid_must_still_beat_the_current_price() {
        let store = MemoryStore::new();
        let auction_id = live_auction(&store, 100).await;
        let now = Utc::now();

        handle_place_bid(
            PlaceBidCommand {
                auction_id,
                bidder_id: 7,
                amount: 200,
            },
            &store,
            now,
        )
        .await
        .unwrap();

        // Same bidder, same amount: no special case for raising one's own bid.
        let err = handle_place_bid(
            PlaceBidCommand {
                auction_id,
                bidder_id: 7,
                amount: 200,
            },
            &store,
            now,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::StaleBid { current_price: 200 }));
    }

    #[tokio::test]
    async fn unknown_auction_is_reported_first() {
        let store = MemoryStore::new();
        let err = handle_place_bid(
            PlaceBidCommand {
                auction_id: 99,
                bidder_id: 7,
                amount: 500,
            },
            &store,
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::UnknownAuction));
    }
}

// endregion: --- Tests
