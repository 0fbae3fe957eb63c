pub mod auction;
pub mod bidding;
pub mod checkout;
pub mod database;
pub mod error;
pub mod handlers;
pub mod payment;
pub mod purchase;
pub mod scheduler;
pub mod settlement;
pub mod store;
