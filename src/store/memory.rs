/// In-memory adapter for the persistence port.
/// The fallback for stores without atomic conditional writes: one mutex per
/// auction and per winner serializes each critical section; there is no
/// global lock, so auctions stay independent units of concurrency. Backs the
/// test suite and local development.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionEdit, Bid, NewAuction, PurchaseStatus, Winner};
use crate::error::CoreError;
use crate::store::{AuctionStore, BidCommit, NewWinner, StatusTransition};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

// endregion: --- Imports

// region:    --- MemoryStore

/// One auction plus its slice of the bid ledger, guarded together so the
/// conditional price update and the ledger append are a single atomic step.
struct AuctionCell {
    auction: Auction,
    bids: Vec<Bid>,
}

#[derive(Default)]
pub struct MemoryStore {
    auctions: RwLock<HashMap<i64, Arc<Mutex<AuctionCell>>>>,
    winners: RwLock<HashMap<i64, Arc<Mutex<Winner>>>>,
    /// The uniqueness constraint: auction_id -> winner record id.
    winner_index: Mutex<HashMap<i64, i64>>,
    next_auction_id: AtomicI64,
    next_bid_id: AtomicI64,
    next_winner_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(counter: &AtomicI64) -> i64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn cell(&self, auction_id: i64) -> Option<Arc<Mutex<AuctionCell>>> {
        self.auctions.read().await.get(&auction_id).cloned()
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, CoreError> {
        let id = Self::next_id(&self.next_auction_id);
        let created = Auction {
            id,
            seller_id: auction.seller_id,
            title: auction.title,
            gem_type: auction.gem_type,
            description: auction.description,
            image_ref: auction.image_ref,
            base_price: auction.base_price,
            current_price: auction.base_price,
            start_time: auction.start_time,
            end_time: auction.end_time,
            created_at: Utc::now(),
        };
        self.auctions.write().await.insert(
            id,
            Arc::new(Mutex::new(AuctionCell {
                auction: created.clone(),
                bids: Vec::new(),
            })),
        );
        Ok(created)
    }

    async fn get_auction(&self, auction_id: i64) -> Result<Option<Auction>, CoreError> {
        match self.cell(auction_id).await {
            Some(cell) => Ok(Some(cell.lock().await.auction.clone())),
            None => Ok(None),
        }
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>, CoreError> {
        let cells: Vec<_> = self.auctions.read().await.values().cloned().collect();
        let mut auctions = Vec::with_capacity(cells.len());
        for cell in cells {
            auctions.push(cell.lock().await.auction.clone());
        }
        auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(auctions)
    }

    async fn update_auction_if_upcoming(
        &self,
        auction_id: i64,
        edit: AuctionEdit,
        now: DateTime<Utc>,
    ) -> Result<Auction, CoreError> {
        let cell = self.cell(auction_id).await.ok_or(CoreError::UnknownAuction)?;
        let mut cell = cell.lock().await;
        if now >= cell.auction.start_time {
            return Err(CoreError::AuctionNotEditable);
        }
        let a = &mut cell.auction;
        if let Some(title) = edit.title {
            a.title = title;
        }
        if let Some(gem_type) = edit.gem_type {
            a.gem_type = gem_type;
        }
        if let Some(description) = edit.description {
            a.description = description;
        }
        if let Some(image_ref) = edit.image_ref {
            a.image_ref = Some(image_ref);
        }
        if let Some(base_price) = edit.base_price {
            // No bids can exist while upcoming, so the price floor moves too.
            a.base_price = base_price;
            a.current_price = base_price;
        }
        if let Some(start_time) = edit.start_time {
            a.start_time = start_time;
        }
        if let Some(end_time) = edit.end_time {
            a.end_time = end_time;
        }
        Ok(a.clone())
    }

    async fn delete_auction_if_upcoming(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let mut auctions = self.auctions.write().await;
        let cell = auctions.get(&auction_id).ok_or(CoreError::UnknownAuction)?;
        if now >= cell.lock().await.auction.start_time {
            return Err(CoreError::AuctionNotEditable);
        }
        auctions.remove(&auction_id);
        Ok(())
    }

    async fn commit_bid(
        &self,
        auction_id: i64,
        bidder_id: i64,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<BidCommit, CoreError> {
        let cell = self.cell(auction_id).await.ok_or(CoreError::UnknownAuction)?;
        let mut cell = cell.lock().await;

        // Re-check the preconditions under the lock; this is the
        // serialization point that stands in for the conditional write.
        if now < cell.auction.start_time || now >= cell.auction.end_time {
            return Ok(BidCommit::Closed);
        }
        if amount <= cell.auction.current_price {
            return Ok(BidCommit::Stale {
                current_price: cell.auction.current_price,
            });
        }

        cell.auction.current_price = amount;
        let bid = Bid {
            id: Self::next_id(&self.next_bid_id),
            auction_id,
            bidder_id,
            amount,
            bid_time: now,
        };
        cell.bids.push(bid.clone());
        Ok(BidCommit::Accepted(bid))
    }

    async fn bid_history(&self, auction_id: i64) -> Result<Vec<Bid>, CoreError> {
        let cell = match self.cell(auction_id).await {
            Some(cell) => cell,
            None => return Ok(Vec::new()),
        };
        let cell = cell.lock().await;
        let mut bids = cell.bids.clone();
        bids.reverse();
        Ok(bids)
    }

    async fn final_bid(&self, auction_id: i64) -> Result<Option<Bid>, CoreError> {
        let cell = match self.cell(auction_id).await {
            Some(cell) => cell,
            None => return Ok(None),
        };
        let cell = cell.lock().await;
        Ok(cell.bids.last().cloned())
    }

    async fn ended_unsettled(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, CoreError> {
        let cells: Vec<_> = self.auctions.read().await.values().cloned().collect();
        let settled = self.winner_index.lock().await.clone();
        let mut ended = Vec::new();
        for cell in cells {
            let auction = cell.lock().await.auction.clone();
            if now >= auction.end_time && !settled.contains_key(&auction.id) {
                ended.push(auction);
            }
        }
        ended.sort_by(|a, b| a.end_time.cmp(&b.end_time));
        Ok(ended)
    }

    async fn insert_winner(&self, winner: NewWinner) -> Result<Option<Winner>, CoreError> {
        // The index lock is held across the insert so two racing settlements
        // of the same auction cannot both create a record.
        let mut index = self.winner_index.lock().await;
        if index.contains_key(&winner.auction_id) {
            return Ok(None);
        }
        let id = Self::next_id(&self.next_winner_id);
        let created = Winner {
            id,
            auction_id: winner.auction_id,
            winner_id: winner.winner_id,
            winning_bid: winner.winning_bid,
            ended_at: winner.ended_at,
            purchase_deadline: winner.purchase_deadline,
            purchase_status: PurchaseStatus::Pending,
            payment_id: None,
            purchased_at: None,
        };
        index.insert(winner.auction_id, id);
        self.winners
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(created.clone())));
        Ok(Some(created))
    }

    async fn get_winner(&self, winner_id: i64) -> Result<Option<Winner>, CoreError> {
        match self.winners.read().await.get(&winner_id).cloned() {
            Some(w) => Ok(Some(w.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn winner_for_auction(&self, auction_id: i64) -> Result<Option<Winner>, CoreError> {
        let id = match self.winner_index.lock().await.get(&auction_id).copied() {
            Some(id) => id,
            None => return Ok(None),
        };
        self.get_winner(id).await
    }

    async fn expire_overdue_winners(&self, now: DateTime<Utc>) -> Result<u64, CoreError> {
        let cells: Vec<_> = self.winners.read().await.values().cloned().collect();
        let mut expired = 0;
        for cell in cells {
            let mut winner = cell.lock().await;
            if winner.purchase_status == PurchaseStatus::Pending && winner.purchase_deadline <= now
            {
                winner.purchase_status = PurchaseStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn set_winner_status_if_pending(
        &self,
        winner_id: i64,
        to: PurchaseStatus,
        payment_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<StatusTransition, CoreError> {
        let cell = self
            .winners
            .read()
            .await
            .get(&winner_id)
            .cloned()
            .ok_or(CoreError::UnknownWinner)?;
        let mut winner = cell.lock().await;
        if winner.purchase_status != PurchaseStatus::Pending {
            return Ok(StatusTransition::NotPending(winner.purchase_status));
        }
        winner.purchase_status = to;
        if to == PurchaseStatus::Paid {
            winner.payment_id = payment_id;
            winner.purchased_at = Some(now);
        }
        Ok(StatusTransition::Applied(winner.clone()))
    }
}

// endregion: --- MemoryStore
