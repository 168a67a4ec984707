use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn};

use crate::domain::models::{
    booking::Booking,
    ledger::{LedgerTransaction, SettlementPlan},
};
use crate::domain::ports::{BookingRepository, LedgerRepository, ListingRepository};
use crate::error::AppError;

/// 10% expressed in basis points.
pub const DEFAULT_COMMISSION_RATE_BPS: i64 = 1_000;
pub const MAX_COMMISSION_RATE_BPS: i64 = 10_000;
const BPS_DENOMINATOR: i128 = 10_000;

/// Rounds half up to the nearest minor unit. The rate is capped at 100%, so the result
/// never exceeds `amount`.
fn apply_rate(amount: i64, rate_bps: i64) -> i64 {
    if amount <= 0 || rate_bps <= 0 {
        return 0;
    }
    let scaled = amount as i128 * rate_bps.min(MAX_COMMISSION_RATE_BPS) as i128;
    ((scaled + BPS_DENOMINATOR / 2) / BPS_DENOMINATOR) as i64
}

/// Pre-recorded amounts take precedence, then the booking's service fee, then the default rate.
pub fn compute_settlement(booking: &Booking, commission_rate_bps: i64) -> SettlementPlan {
    let commission = if booking.platform_commission > 0 {
        booking.platform_commission
    } else if booking.service_fee > 0 {
        booking.service_fee
    } else {
        apply_rate(booking.total_price, commission_rate_bps)
    }
    .max(0);

    let host_share = if booking.host_earnings > 0 {
        booking.host_earnings
    } else {
        (booking.total_price - commission).max(0)
    };

    SettlementPlan {
        platform_commission: commission,
        host_share: host_share.max(0),
    }
}

pub struct SettlementService {
    booking_repo: Arc<dyn BookingRepository>,
    listing_repo: Arc<dyn ListingRepository>,
    ledger_repo: Arc<dyn LedgerRepository>,
    commission_rate_bps: i64,
}

impl SettlementService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        listing_repo: Arc<dyn ListingRepository>,
        ledger_repo: Arc<dyn LedgerRepository>,
        commission_rate_bps: i64,
    ) -> Self {
        Self { booking_repo, listing_repo, ledger_repo, commission_rate_bps }
    }

    /// Splits a booking's price into platform commission and host earnings exactly once.
    ///
    /// Returns `Ok(None)` for an unknown booking. An already settled booking comes back
    /// unchanged, without touching the host balance or the ledger.
    pub async fn settle_booking(&self, booking_id: &str) -> Result<Option<Booking>, AppError> {
        let Some(booking) = self.booking_repo.find_by_id(booking_id).await? else {
            warn!("Settlement requested for unknown booking {}", booking_id);
            return Ok(None);
        };

        if booking.is_settled() {
            info!("Booking {} already settled, skipping", booking.id);
            return Ok(Some(booking));
        }

        let plan = compute_settlement(&booking, self.commission_rate_bps);

        let listing_title = match self.listing_repo.find_by_id(&booking.listing_id).await {
            Ok(listing) => listing.map(|l| l.title),
            Err(e) => {
                warn!("Listing lookup failed for booking {}: {}", booking.id, e);
                None
            }
        };

        let now = Utc::now();
        let entry = LedgerTransaction::booking_payment(
            &booking.host_id,
            &booking.id,
            plan.host_share,
            listing_title.as_deref(),
            now,
        );

        match self.ledger_repo.apply_settlement(&booking.id, &plan, &entry, now).await? {
            Some(settled) => {
                info!(
                    booking_id = %settled.id,
                    host_id = %settled.host_id,
                    commission = plan.platform_commission,
                    host_share = plan.host_share,
                    "Booking settled"
                );
                Ok(Some(settled))
            }
            None => {
                info!("Booking {} was settled concurrently", booking.id);
                self.booking_repo.find_by_id(&booking.id).await
            }
        }
    }
}
