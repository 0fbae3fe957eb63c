//! SQL statements for the Postgres store.

/// Create an auction; current_price starts at base_price.
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (seller_id, title, gem_type, description, image_ref, base_price, current_price, start_time, end_time, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9)
    RETURNING id, seller_id, title, gem_type, description, image_ref, base_price, current_price, start_time, end_time, created_at
"#;

/// Fetch one auction.
pub const GET_AUCTION: &str = "SELECT id, seller_id, title, gem_type, description, image_ref, base_price, current_price, start_time, end_time, created_at FROM auctions WHERE id = $1";

/// Fetch all auctions, newest listing first.
pub const LIST_AUCTIONS: &str = "SELECT id, seller_id, title, gem_type, description, image_ref, base_price, current_price, start_time, end_time, created_at FROM auctions ORDER BY created_at DESC";

/// Seller edit, conditioned on the auction still being upcoming.
pub const UPDATE_AUCTION_IF_UPCOMING: &str = r#"
    UPDATE auctions SET
        title = COALESCE($2, title),
        gem_type = COALESCE($3, gem_type),
        description = COALESCE($4, description),
        image_ref = COALESCE($5, image_ref),
        base_price = COALESCE($6, base_price),
        current_price = COALESCE($6, current_price),
        start_time = COALESCE($7, start_time),
        end_time = COALESCE($8, end_time)
    WHERE id = $1 AND start_time > $9
    RETURNING id, seller_id, title, gem_type, description, image_ref, base_price, current_price, start_time, end_time, created_at
"#;

/// Delete, conditioned on the auction still being upcoming.
pub const DELETE_AUCTION_IF_UPCOMING: &str =
    "DELETE FROM auctions WHERE id = $1 AND start_time > $2";

/// The conditional bid commit. Only the update whose price precondition
/// still holds at execution time succeeds; the time predicates keep an
/// auction that ended mid-flight from taking one more bid.
pub const COMMIT_BID_PRICE: &str = r#"
    UPDATE auctions SET current_price = $1
    WHERE id = $2 AND current_price < $1 AND start_time <= $3 AND end_time > $3
    RETURNING current_price
"#;

/// Append one ledger entry.
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, amount, bid_time)
    VALUES ($1, $2, $3, $4)
    RETURNING id, auction_id, bidder_id, amount, bid_time
"#;

/// Bid history, most recent first.
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, auction_id, bidder_id, amount, bid_time
    FROM bids
    WHERE auction_id = $1
    ORDER BY bid_time DESC, id DESC
"#;

/// The most recent committed bid holds the final current_price.
pub const GET_FINAL_BID: &str = r#"
    SELECT id, auction_id, bidder_id, amount, bid_time
    FROM bids
    WHERE auction_id = $1
    ORDER BY amount DESC
    LIMIT 1
"#;

/// Ended auctions with no winner record yet.
pub const GET_ENDED_UNSETTLED: &str = r#"
    SELECT a.id, a.seller_id, a.title, a.gem_type, a.description, a.image_ref,
           a.base_price, a.current_price, a.start_time, a.end_time, a.created_at
    FROM auctions a
    LEFT JOIN winners w ON w.auction_id = a.id
    WHERE a.end_time <= $1 AND w.id IS NULL
    ORDER BY a.end_time ASC
"#;

/// Exactly-once settlement: the uniqueness constraint on auction_id is the
/// idempotency key; a racing insert observes no returned row.
pub const INSERT_WINNER: &str = r#"
    INSERT INTO winners (auction_id, winner_id, winning_bid, ended_at, purchase_deadline, purchase_status)
    VALUES ($1, $2, $3, $4, $5, 'PENDING')
    ON CONFLICT (auction_id) DO NOTHING
    RETURNING id, auction_id, winner_id, winning_bid, ended_at, purchase_deadline, purchase_status, payment_id, purchased_at
"#;

/// Fetch one winner record.
pub const GET_WINNER: &str = "SELECT id, auction_id, winner_id, winning_bid, ended_at, purchase_deadline, purchase_status, payment_id, purchased_at FROM winners WHERE id = $1";

/// Fetch the winner record of an auction.
pub const GET_WINNER_FOR_AUCTION: &str = "SELECT id, auction_id, winner_id, winning_bid, ended_at, purchase_deadline, purchase_status, payment_id, purchased_at FROM winners WHERE auction_id = $1";

/// Expiry sweep: conditioned on the status still being PENDING at write
/// time, so a concurrent payment confirmation cannot be clobbered.
pub const EXPIRE_OVERDUE_WINNERS: &str = r#"
    UPDATE winners SET purchase_status = 'EXPIRED'
    WHERE purchase_status = 'PENDING' AND purchase_deadline <= $1
"#;

/// Conditional `pending -> terminal` status write.
pub const SET_WINNER_STATUS_IF_PENDING: &str = r#"
    UPDATE winners SET
        purchase_status = $2,
        payment_id = COALESCE($3, payment_id),
        purchased_at = COALESCE($4, purchased_at)
    WHERE id = $1 AND purchase_status = 'PENDING'
    RETURNING id, auction_id, winner_id, winning_bid, ended_at, purchase_deadline, purchase_status, payment_id, purchased_at
"#;
