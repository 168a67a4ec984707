use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::cron::CronAuth;
use crate::api::dtos::responses::SweepResponse;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::{info_span, Instrument};

pub async fn complete_bookings(
    State(state): State<Arc<AppState>>,
    _auth: CronAuth,
) -> Result<impl IntoResponse, AppError> {
    let report = state.lifecycle_service.clone()
        .run_sweep(Utc::now())
        .instrument(info_span!("booking_sweep", trigger = "http"))
        .await?;

    Ok(Json(SweepResponse {
        message: format!("Completed {} bookings", report.completed),
        report,
    }))
}
