/// Postgres adapter for the persistence port.
/// Every race-sensitive method is a single conditional `UPDATE ... WHERE`
/// (or `INSERT ... ON CONFLICT DO NOTHING`), so no advisory lock is needed:
/// the store's atomic conditional writes serialize conflicting updates.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionEdit, Bid, NewAuction, PurchaseStatus, Winner};
use crate::error::CoreError;
use crate::store::{queries, AuctionStore, BidCommit, NewWinner, StatusTransition};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- PostgresStore

pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Winner rows are mapped by hand so `purchase_status` stays a typed
    /// enum in Rust while remaining TEXT in the schema.
    fn winner_from_row(row: &PgRow) -> Result<Winner, CoreError> {
        let raw: String = row.try_get("purchase_status")?;
        let purchase_status = PurchaseStatus::parse(&raw).ok_or_else(|| {
            CoreError::Database(sqlx::Error::Decode(
                format!("unrecognized purchase_status {raw:?}").into(),
            ))
        })?;
        Ok(Winner {
            id: row.try_get("id")?,
            auction_id: row.try_get("auction_id")?,
            winner_id: row.try_get("winner_id")?,
            winning_bid: row.try_get("winning_bid")?,
            ended_at: row.try_get("ended_at")?,
            purchase_deadline: row.try_get("purchase_deadline")?,
            purchase_status,
            payment_id: row.try_get("payment_id")?,
            purchased_at: row.try_get("purchased_at")?,
        })
    }
}

#[async_trait]
impl AuctionStore for PostgresStore {
    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, CoreError> {
        let created = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
            .bind(auction.seller_id)
            .bind(&auction.title)
            .bind(&auction.gem_type)
            .bind(&auction.description)
            .bind(&auction.image_ref)
            .bind(auction.base_price)
            .bind(auction.start_time)
            .bind(auction.end_time)
            .bind(Utc::now())
            .fetch_one(&*self.pool)
            .await?;
        Ok(created)
    }

    async fn get_auction(&self, auction_id: i64) -> Result<Option<Auction>, CoreError> {
        let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
            .bind(auction_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(auction)
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>, CoreError> {
        let auctions = sqlx::query_as::<_, Auction>(queries::LIST_AUCTIONS)
            .fetch_all(&*self.pool)
            .await?;
        Ok(auctions)
    }

    async fn update_auction_if_upcoming(
        &self,
        auction_id: i64,
        edit: AuctionEdit,
        now: DateTime<Utc>,
    ) -> Result<Auction, CoreError> {
        let updated = sqlx::query_as::<_, Auction>(queries::UPDATE_AUCTION_IF_UPCOMING)
            .bind(auction_id)
            .bind(&edit.title)
            .bind(&edit.gem_type)
            .bind(&edit.description)
            .bind(&edit.image_ref)
            .bind(edit.base_price)
            .bind(edit.start_time)
            .bind(edit.end_time)
            .bind(now)
            .fetch_optional(&*self.pool)
            .await?;
        match updated {
            Some(auction) => Ok(auction),
            // Distinguish a missing auction from one already past upcoming.
            None => match self.get_auction(auction_id).await? {
                Some(_) => Err(CoreError::AuctionNotEditable),
                None => Err(CoreError::UnknownAuction),
            },
        }
    }

    async fn delete_auction_if_upcoming(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let result = sqlx::query(queries::DELETE_AUCTION_IF_UPCOMING)
            .bind(auction_id)
            .bind(now)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 1 {
            return Ok(());
        }
        match self.get_auction(auction_id).await? {
            Some(_) => Err(CoreError::AuctionNotEditable),
            None => Err(CoreError::UnknownAuction),
        }
    }

    async fn commit_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<BidCommit, CoreError> {
        // Price update and ledger append commit or roll back together.
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(queries::COMMIT_BID_PRICE)
            .bind(amount)
            .bind(auction_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

        if updated.is_none() {
            tx.rollback().await?;
            // The precondition failed; re-read to tell the caller why.
            return match self.get_auction(auction_id).await? {
                None => Err(CoreError::UnknownAuction),
                Some(a) if now >= a.end_time || now < a.start_time => Ok(BidCommit::Closed),
                Some(a) => Ok(BidCommit::Stale {
                    current_price: a.current_price,
                }),
            };
        }

        let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
            .bind(auction_id)
            .bind(bidder_id)
            .bind(amount)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(
            "{:<12} --> bid committed: auction={} price={}",
            "Store", auction_id, amount
        );
        Ok(BidCommit::Accepted(bid))
    }

    async fn bid_history(&self, auction_id: i64) -> Result<Vec<Bid>, CoreError> {
        let bids = sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
            .bind(auction_id)
            .fetch_all(&*self.pool)
            .await?;
        Ok(bids)
    }

    async fn final_bid(&self, auction_id: i64) -> Result<Option<Bid>, CoreError> {
        let bid = sqlx::query_as::<_, Bid>(queries::GET_FINAL_BID)
            .bind(auction_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(bid)
    }

    async fn ended_unsettled(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, CoreError> {
        let auctions = sqlx::query_as::<_, Auction>(queries::GET_ENDED_UNSETTLED)
            .bind(now)
            .fetch_all(&*self.pool)
            .await?;
        Ok(auctions)
    }

    async fn insert_winner(&self, winner: NewWinner) -> Result<Option<Winner>, CoreError> {
        let row = sqlx::query(queries::INSERT_WINNER)
            .bind(winner.auction_id)
            .bind(winner.winner_id)
            .bind(winner.winning_bid)
            .bind(winner.ended_at)
            .bind(winner.purchase_deadline)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(|r| Self::winner_from_row(&r)).transpose()
    }

    async fn get_winner(&self, winner_id: i64) -> Result<Option<Winner>, CoreError> {
        let row = sqlx::query(queries::GET_WINNER)
            .bind(winner_id)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(|r| Self::winner_from_row(&r)).transpose()
    }

    async fn winner_for_auction(&self, auction_id: i64) -> Result<Option<Winner>, CoreError> {
        let row = sqlx::query(queries::GET_WINNER_FOR_AUCTION)
            .bind(auction_id)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(|r| Self::winner_from_row(&r)).transpose()
    }

    async fn expire_overdue_winners(&self, now: DateTime<Utc>) -> Result<u64, CoreError> {
        let result = sqlx::query(queries::EXPIRE_OVERDUE_WINNERS)
            .bind(now)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_winner_status_if_pending(
        &self,
        winner_id: i64,
        to: PurchaseStatus,
        payment_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<StatusTransition, CoreError> {
        let purchased_at = match to {
            PurchaseStatus::Paid => Some(now),
            _ => None,
        };
        let row = sqlx::query(queries::SET_WINNER_STATUS_IF_PENDING)
            .bind(winner_id)
            .bind(to.as_str())
            .bind(&payment_id)
            .bind(purchased_at)
            .fetch_optional(&*self.pool)
            .await?;
        match row {
            Some(r) => Ok(StatusTransition::Applied(Self::winner_from_row(&r)?)),
            None => match self.get_winner(winner_id).await? {
                Some(w) => Ok(StatusTransition::NotPending(w.purchase_status)),
                None => Err(CoreError::UnknownWinner),
            },
        }
    }
}

// endregion: --- PostgresStore
