use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::PayoutRequest;
use crate::domain::models::ledger::{HostProfile, LedgerTransaction};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn list_host_bookings(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_by_host(&host_id).await?;
    Ok(Json(bookings))
}

pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.ledger_repo.find_host_profile(&host_id).await?
        .unwrap_or_else(|| HostProfile::empty(host_id));
    Ok(Json(profile))
}

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state.ledger_repo.list_transactions(&host_id).await?;
    Ok(Json(transactions))
}

pub async fn request_payout(
    State(state): State<Arc<AppState>>,
    Path(host_id): Path<String>,
    Json(payload): Json<PayoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.amount <= 0 {
        return Err(AppError::Validation("amount must be positive".into()));
    }

    let entry = LedgerTransaction::payout(&host_id, payload.amount, payload.note.as_deref(), Utc::now());
    let profile = state.ledger_repo.record_payout(&entry).await?
        .ok_or(AppError::Conflict("Insufficient available balance".into()))?;

    info!("Paid out {} to host {}, remaining {}", payload.amount, host_id, profile.available_balance);
    Ok(Json(serde_json::json!({
        "transaction": entry,
        "balance": profile
    })))
}
