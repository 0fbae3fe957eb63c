/// Seller commands for the auction lifecycle.
/// Edits and deletion are gated on the auction still being upcoming; the
/// gate is enforced twice, once here against a fresh read and once inside
/// the store's conditional write, so a start time crossed mid-request still
/// rejects cleanly.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionEdit, NewAuction};
use crate::error::CoreError;
use crate::store::AuctionStore;
use chrono::{DateTime, Utc};
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// List a gem for auction. The listing starts upcoming with
/// `current_price = base_price`.
pub async fn handle_create_auction(
    cmd: NewAuction,
    store: &dyn AuctionStore,
) -> Result<Auction, CoreError> {
    info!(
        "{:<12} --> create auction: seller={} title={:?}",
        "Command", cmd.seller_id, cmd.title
    );
    if cmd.base_price < 0 {
        return Err(CoreError::InvalidAuction {
            reason: "base_price must be >= 0".into(),
        });
    }
    if cmd.end_time <= cmd.start_time {
        return Err(CoreError::InvalidAuction {
            reason: "end_time must be after start_time".into(),
        });
    }
    store.insert_auction(cmd).await
}

/// Edit an upcoming auction. Fails with `AuctionNotEditable` once live or
/// ended.
pub async fn handle_edit_auction(
    auction_id: i64,
    edit: AuctionEdit,
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> Result<Auction, CoreError> {
    info!("{:<12} --> edit auction: id={}", "Command", auction_id);
    if let Some(base_price) = edit.base_price {
        if base_price < 0 {
            return Err(CoreError::InvalidAuction {
                reason: "base_price must be >= 0".into(),
            });
        }
    }
    if edit.start_time.is_some() || edit.end_time.is_some() {
        // A single-sided schedule edit must still leave end after start, so
        // validate against the stored row it will merge over.
        let auction = store
            .get_auction(auction_id)
            .await?
            .ok_or(CoreError::UnknownAuction)?;
        let start = edit.start_time.unwrap_or(auction.start_time);
        let end = edit.end_time.unwrap_or(auction.end_time);
        if end <= start {
            return Err(CoreError::InvalidAuction {
                reason: "end_time must be after start_time".into(),
            });
        }
    }
    store.update_auction_if_upcoming(auction_id, edit, now).await
}

/// Delete an upcoming auction. Fails with `AuctionNotEditable` once live or
/// ended.
pub async fn handle_delete_auction(
    auction_id: i64,
    store: &dyn AuctionStore,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    info!("{:<12} --> delete auction: id={}", "Command", auction_id);
    store.delete_auction_if_upcoming(auction_id, now).await
}

// endregion: --- Commands

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::Duration;

    fn listing(start_offset_mins: i64, end_offset_mins: i64) -> NewAuction {
        let now = Utc::now();
        NewAuction {
            seller_id: 3,
            title: "Imperial Topaz".into(),
            gem_type: "topaz".into(),
            description: "4.5ct, untreated".into(),
            image_ref: None,
            base_price: 250,
            start_time: now + Duration::minutes(start_offset_mins),
            end_time: now + Duration::minutes(end_offset_mins),
        }
    }

    #[tokio::test]
    async fn creation_validates_price_and_schedule() {
        let store = MemoryStore::new();

        let mut negative = listing(10, 20);
        negative.base_price = -1;
        assert!(matches!(
            handle_create_auction(negative, &store).await.unwrap_err(),
            CoreError::InvalidAuction { .. }
        ));

        let mut inverted = listing(20, 10);
        inverted.base_price = 250;
        assert!(matches!(
            handle_create_auction(inverted, &store).await.unwrap_err(),
            CoreError::InvalidAuction { .. }
        ));

        let created = handle_create_auction(listing(10, 20), &store).await.unwrap();
        assert_eq!(created.current_price, created.base_price);
    }

    #[tokio::test]
    async fn upcoming_auctions_are_editable_and_deletable() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let created = handle_create_auction(listing(30, 90), &store).await.unwrap();

        let edited = handle_edit_auction(
            created.id,
            AuctionEdit {
                title: Some("Imperial Topaz, certified".into()),
                gem_type: None,
                description: None,
                image_ref: None,
                base_price: Some(300),
                start_time: None,
                end_time: None,
            },
            &store,
            now,
        )
        .await
        .unwrap();
        assert_eq!(edited.title, "Imperial Topaz, certified");
        assert_eq!(edited.base_price, 300);
        assert_eq!(edited.current_price, 300);

        handle_delete_auction(created.id, &store, now).await.unwrap();
        assert!(store.get_auction(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn single_sided_schedule_edit_cannot_invert_the_window() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let created = handle_create_auction(listing(10, 20), &store).await.unwrap();

        // Moving only start_time past the stored end_time must reject.
        let err = handle_edit_auction(
            created.id,
            AuctionEdit {
                title: None,
                gem_type: None,
                description: None,
                image_ref: None,
                base_price: None,
                start_time: Some(now + Duration::minutes(30)),
                end_time: None,
            },
            &store,
            now,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAuction { .. }));

        // Moving only end_time before the stored start_time must reject.
        let err = handle_edit_auction(
            created.id,
            AuctionEdit {
                title: None,
                gem_type: None,
                description: None,
                image_ref: None,
                base_price: None,
                start_time: None,
                end_time: Some(now + Duration::minutes(5)),
            },
            &store,
            now,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAuction { .. }));

        // The stored schedule is untouched and still consistent.
        let after = store.get_auction(created.id).await.unwrap().unwrap();
        assert_eq!(after.start_time, created.start_time);
        assert_eq!(after.end_time, created.end_time);
        assert!(after.end_time > after.start_time);

        // A single-sided edit that keeps the window consistent goes through.
        let edited = handle_edit_auction(
            created.id,
            AuctionEdit {
                title: None,
                gem_type: None,
                description: None,
                image_ref: None,
                base_price: None,
                start_time: Some(now + Duration::minutes(15)),
                end_time: None,
            },
            &store,
            now,
        )
        .await
        .unwrap();
        assert!(edited.end_time > edited.start_time);
    }

    #[tokio::test]
    async fn live_and_ended_auctions_reject_edits() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let live = handle_create_auction(listing(-10, 60), &store).await.unwrap();
        let ended = handle_create_auction(listing(-90, -30), &store).await.unwrap();

        for id in [live.id, ended.id] {
            let err = handle_edit_auction(
                id,
                AuctionEdit {
                    title: Some("too late".into()),
                    gem_type: None,
                    description: None,
                    image_ref: None,
                    base_price: None,
                    start_time: None,
                    end_time: None,
                },
                &store,
                now,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, CoreError::AuctionNotEditable));

            let err = handle_delete_auction(id, &store, now).await.unwrap_err();
            assert!(matches!(err, CoreError::AuctionNotEditable));
        }
    }

    #[tokio::test]
    async fn missing_auction_is_unknown() {
        let store = MemoryStore::new();
        let err = handle_delete_auction(404, &store, Utc::now()).await.unwrap_err();
        assert!(matches!(err, CoreError::UnknownAuction));
    }
}

// endregion: --- Tests
