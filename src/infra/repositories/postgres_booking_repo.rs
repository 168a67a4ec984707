use crate::domain::{
    models::booking::{AdditionalService, Booking, BookingStatus},
    ports::BookingRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use chrono::{DateTime, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>("INSERT INTO bookings (id, listing_id, guest_id, host_id, status, check_in, check_out, total_price, service_fee, platform_commission, host_earnings, host_payout_status, host_payout_settled_at, additional_services, completed_at, cancelled_at, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) RETURNING *")
            .bind(&booking.id).bind(&booking.listing_id).bind(&booking.guest_id).bind(&booking.host_id)
            .bind(&booking.status).bind(booking.check_in).bind(booking.check_out).bind(booking.total_price)
            .bind(booking.service_fee).bind(booking.platform_commission).bind(booking.host_earnings)
            .bind(&booking.host_payout_status).bind(booking.host_payout_settled_at).bind(&booking.additional_services)
            .bind(booking.completed_at).bind(booking.cancelled_at).bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_host(&self, host_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE host_id = $1 ORDER BY check_in ASC").bind(host_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_due_for_completion(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE status = 'CONFIRMED' AND check_out <= $1")
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_unsettled_completed(&self, limit: i64) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE status = 'COMPLETED' AND host_payout_settled_at IS NULL AND platform_commission = 0 AND host_earnings = 0
             ORDER BY completed_at ASC LIMIT $1"
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn transition(
        &self,
        id: &str,
        expected: BookingStatus,
        expected_updated_at: DateTime<Utc>,
        next: BookingStatus,
        services: &[AdditionalService],
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let completed_at = (next == BookingStatus::Completed).then_some(now);
        let cancelled_at = (next == BookingStatus::Cancelled).then_some(now);
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = $1, additional_services = $2, completed_at = COALESCE($3, completed_at), cancelled_at = COALESCE($4, cancelled_at), updated_at = $5 WHERE id = $6 AND status = $7 AND updated_at = $8 RETURNING *")
            .bind(next.as_str()).bind(Json(services)).bind(completed_at).bind(cancelled_at).bind(now)
            .bind(id).bind(expected.as_str()).bind(expected_updated_at)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_services(
        &self,
        id: &str,
        expected_updated_at: DateTime<Utc>,
        services: &[AdditionalService],
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET additional_services = $1, updated_at = $2 WHERE id = $3 AND updated_at = $4 AND status IN ('PENDING', 'CONFIRMED') RETURNING *")
            .bind(Json(services)).bind(now).bind(id).bind(expected_updated_at)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
