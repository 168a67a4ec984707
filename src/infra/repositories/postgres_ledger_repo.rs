use crate::domain::{
    models::{booking::Booking, ledger::{HostProfile, LedgerTransaction, SettlementPlan, PAYOUT_STATUS_PENDING}},
    ports::LedgerRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{DateTime, Utc};

pub struct PostgresLedgerRepo {
    pool: PgPool,
}

impl PostgresLedgerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepo {
    async fn apply_settlement(&self, booking_id: &str, plan: &SettlementPlan, entry: &LedgerTransaction, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let settled = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET platform_commission = $1, host_earnings = $2, host_payout_status = $3, host_payout_settled_at = $4, updated_at = $5
             WHERE id = $6 AND host_payout_settled_at IS NULL AND platform_commission = 0 AND host_earnings = 0
             RETURNING *"
        )
            .bind(plan.platform_commission).bind(plan.host_share).bind(PAYOUT_STATUS_PENDING).bind(now).bind(now)
            .bind(booking_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let Some(settled) = settled else {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(None);
        };

        sqlx::query(
            "INSERT INTO host_profiles (host_id, total_earnings, available_balance, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (host_id) DO UPDATE SET
                total_earnings = host_profiles.total_earnings + excluded.total_earnings,
                available_balance = host_profiles.available_balance + excluded.available_balance,
                updated_at = excluded.updated_at"
        )
            .bind(&settled.host_id).bind(plan.host_share).bind(plan.host_share).bind(now).bind(now)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        sqlx::query("INSERT INTO transactions (id, host_id, transaction_type, amount, status, description, reference_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(&entry.id).bind(&entry.host_id).bind(&entry.transaction_type).bind(entry.amount)
            .bind(&entry.status).bind(&entry.description).bind(&entry.reference_id).bind(entry.created_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(settled))
    }

    async fn find_host_profile(&self, host_id: &str) -> Result<Option<HostProfile>, AppError> {
        sqlx::query_as::<_, HostProfile>("SELECT * FROM host_profiles WHERE host_id = $1").bind(host_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_transactions(&self, host_id: &str) -> Result<Vec<LedgerTransaction>, AppError> {
        sqlx::query_as::<_, LedgerTransaction>("SELECT * FROM transactions WHERE host_id = $1 ORDER BY created_at DESC").bind(host_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn record_payout(&self, entry: &LedgerTransaction) -> Result<Option<HostProfile>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let profile = sqlx::query_as::<_, HostProfile>(
            "UPDATE host_profiles SET available_balance = available_balance - $1, updated_at = $2
             WHERE host_id = $3 AND available_balance >= $4
             RETURNING *"
        )
            .bind(entry.amount).bind(entry.created_at).bind(&entry.host_id).bind(entry.amount)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        let Some(profile) = profile else {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(None);
        };

        sqlx::query("INSERT INTO transactions (id, host_id, transaction_type, amount, status, description, reference_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(&entry.id).bind(&entry.host_id).bind(&entry.transaction_type).bind(entry.amount)
            .bind(&entry.status).bind(&entry.description).bind(&entry.reference_id).bind(entry.created_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(profile))
    }
}
