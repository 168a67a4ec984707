pub mod booking;
pub mod ledger;
pub mod listing;
