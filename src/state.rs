use std::sync::Arc;
use crate::domain::ports::{BookingRepository, LedgerRepository, ListingRepository};
use crate::domain::services::{lifecycle::LifecycleService, settlement::SettlementService};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub listing_repo: Arc<dyn ListingRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub ledger_repo: Arc<dyn LedgerRepository>,
    pub settlement_service: Arc<SettlementService>,
    pub lifecycle_service: Arc<LifecycleService>,
}

impl AppState {
    /// Wires the domain services on top of whichever repository backend was selected.
    pub fn new(
        config: Config,
        listing_repo: Arc<dyn ListingRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        ledger_repo: Arc<dyn LedgerRepository>,
    ) -> Self {
        let settlement_service = Arc::new(SettlementService::new(
            booking_repo.clone(),
            listing_repo.clone(),
            ledger_repo.clone(),
            config.commission_rate_bps,
        ));
        let lifecycle_service = Arc::new(LifecycleService::new(
            booking_repo.clone(),
            settlement_service.clone(),
            std::time::Duration::from_secs(config.sweep_booking_timeout_secs),
        ));

        Self {
            config,
            listing_repo,
            booking_repo,
            ledger_repo,
            settlement_service,
            lifecycle_service,
        }
    }
}
