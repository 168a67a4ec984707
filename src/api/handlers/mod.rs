pub mod booking;
pub mod cron;
pub mod health;
pub mod host;
pub mod listing;
