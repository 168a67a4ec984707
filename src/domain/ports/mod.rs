use crate::domain::models::{
    booking::{AdditionalService, Booking, BookingStatus},
    ledger::{HostProfile, LedgerTransaction, SettlementPlan},
    listing::Listing,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create(&self, listing: &Listing) -> Result<Listing, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Listing>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_host(&self, host_id: &str) -> Result<Vec<Booking>, AppError>;
    /// CONFIRMED bookings whose checkout is at or before `now`.
    async fn find_due_for_completion(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
    /// COMPLETED bookings that never received a settlement.
    async fn find_unsettled_completed(&self, limit: i64) -> Result<Vec<Booking>, AppError>;
    /// Conditional status change. Returns `None` when the booking left `expected` or was
    /// modified after `expected_updated_at`, so `services` is never written over newer data.
    async fn transition(
        &self,
        id: &str,
        expected: BookingStatus,
        expected_updated_at: DateTime<Utc>,
        next: BookingStatus,
        services: &[AdditionalService],
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>;
    /// Replaces the embedded services. Returns `None` when the row changed since `expected_updated_at`.
    async fn update_services(
        &self,
        id: &str,
        expected_updated_at: DateTime<Utc>,
        services: &[AdditionalService],
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>;
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Writes the booking split, the host balance increment and the ledger entry in one
    /// transaction. Returns `None` when the booking was already settled.
    async fn apply_settlement(
        &self,
        booking_id: &str,
        plan: &SettlementPlan,
        entry: &LedgerTransaction,
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>;
    async fn find_host_profile(&self, host_id: &str) -> Result<Option<HostProfile>, AppError>;
    async fn list_transactions(&self, host_id: &str) -> Result<Vec<LedgerTransaction>, AppError>;
    /// Debits the available balance and records the payout. Returns `None` on insufficient funds.
    async fn record_payout(&self, entry: &LedgerTransaction) -> Result<Option<HostProfile>, AppError>;
}
