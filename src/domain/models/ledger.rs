use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const TX_BOOKING_PAYMENT: &str = "BOOKING_PAYMENT";
pub const TX_PAYOUT: &str = "PAYOUT";
pub const TX_STATUS_COMPLETED: &str = "COMPLETED";

pub const PAYOUT_STATUS_PENDING: &str = "PENDING";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct HostProfile {
    pub host_id: String,
    pub total_earnings: i64,
    pub available_balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HostProfile {
    /// What a host with no settled bookings looks like.
    pub fn empty(host_id: String) -> Self {
        let now = Utc::now();
        Self {
            host_id,
            total_earnings: 0,
            available_balance: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Immutable ledger entry. Rows are inserted once and never updated.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct LedgerTransaction {
    pub id: String,
    pub host_id: String,
    pub transaction_type: String,
    pub amount: i64,
    pub status: String,
    pub description: String,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerTransaction {
    pub fn booking_payment(host_id: &str, booking_id: &str, amount: i64, listing_title: Option<&str>, now: DateTime<Utc>) -> Self {
        let description = match listing_title {
            Some(title) if !title.trim().is_empty() => format!("Payment for booking: {}", title),
            _ => "Payment for booking".to_string(),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            host_id: host_id.to_string(),
            transaction_type: TX_BOOKING_PAYMENT.to_string(),
            amount,
            status: TX_STATUS_COMPLETED.to_string(),
            description,
            reference_id: Some(booking_id.to_string()),
            created_at: now,
        }
    }

    pub fn payout(host_id: &str, amount: i64, note: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            host_id: host_id.to_string(),
            transaction_type: TX_PAYOUT.to_string(),
            amount,
            status: TX_STATUS_COMPLETED.to_string(),
            description: note.map(|n| format!("Payout: {}", n)).unwrap_or_else(|| "Payout".to_string()),
            reference_id: None,
            created_at: now,
        }
    }
}

/// Split of a completed booking's price between the platform and the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettlementPlan {
    pub platform_commission: i64,
    pub host_share: i64,
}
