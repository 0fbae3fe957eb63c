/// Periodic sweeps.
/// The lifecycle is time-derived, so nothing fires on a transition; an
/// explicit sweep has to observe ended auctions and overdue wins. Both
/// sweeps are idempotent and conditional, so overlapping a sweep with live
/// request handling (or with another sweep pass) is safe, and a pass can be
/// cancelled between batches without loss.
// region:    --- Imports
use crate::purchase;
use crate::settlement;
use crate::store::AuctionStore;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::error;

// endregion: --- Imports

// region:    --- Sweep Scheduler

pub struct SweepScheduler {
    store: Arc<dyn AuctionStore>,
    period: Duration,
}

impl SweepScheduler {
    pub fn new(store: Arc<dyn AuctionStore>, period: Duration) -> Self {
        Self { store, period }
    }

    /// Spawn the settlement and expiry loops.
    pub fn start(&self) {
        let store = Arc::clone(&self.store);
        let period = self.period;
        tokio::spawn(async move {
            let mut interval = interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = settlement::run_settlement_sweep(store.as_ref(), Utc::now()).await
                {
                    error!("{:<12} --> settlement sweep failed: {:?}", "Scheduler", e);
                }
            }
        });

        let store = Arc::clone(&self.store);
        let period = self.period;
        tokio::spawn(async move {
            let mut interval = interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = purchase::run_expiry_sweep(store.as_ref(), Utc::now()).await {
                    error!("{:<12} --> expiry sweep failed: {:?}", "Scheduler", e);
                }
            }
        });
    }
}

// endregion: --- Sweep Scheduler
