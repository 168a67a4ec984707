use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::{AddServiceRequest, CancelBookingRequest, CreateBookingRequest, UpdateServiceStatusRequest};
use crate::domain::models::booking::{AdditionalService, Booking, BookingStatus, NewBookingParams};
use crate::error::AppError;
use std::collections::HashSet;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

fn require_actor(actor: &str) -> Result<(), AppError> {
    if actor.trim().is_empty() {
        return Err(AppError::Validation("actor is required".into()));
    }
    Ok(())
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let listing = state.listing_repo.find_by_id(&payload.listing_id).await?
        .ok_or(AppError::NotFound("Listing not found".into()))?;

    if payload.guest_id.trim().is_empty() {
        return Err(AppError::Validation("guest_id is required".into()));
    }
    if payload.check_out <= payload.check_in {
        return Err(AppError::Validation("check_out must be after check_in".into()));
    }
    if payload.total_price < 0 {
        return Err(AppError::Validation("total_price cannot be negative".into()));
    }
    let service_fee = payload.service_fee.unwrap_or(0);
    if service_fee < 0 || service_fee > payload.total_price {
        return Err(AppError::Validation("service_fee must be between 0 and total_price".into()));
    }

    let now = Utc::now();
    let mut seen = HashSet::new();
    let mut services = Vec::with_capacity(payload.additional_services.len());
    for requested in payload.additional_services {
        if requested.name.trim().is_empty() {
            return Err(AppError::Validation("Additional service name is required".into()));
        }
        let service_id = requested.service_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        if !seen.insert(service_id.clone()) {
            return Err(AppError::Validation(format!("Duplicate service id {}", service_id)));
        }
        services.push(AdditionalService::new(service_id, requested.name, &payload.guest_id, now));
    }

    let booking = Booking::new(NewBookingParams {
        listing_id: listing.id,
        guest_id: payload.guest_id,
        host_id: listing.host_id,
        check_in: payload.check_in,
        check_out: payload.check_out,
        total_price: payload.total_price,
        service_fee,
        additional_services: services,
    });

    let created = state.booking_repo.create(&booking).await?;
    info!("Created booking {} for listing {}", created.id, created.listing_id);
    Ok(Json(created))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    Ok(Json(booking))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let confirmed = state.lifecycle_service.confirm(&booking_id, Utc::now()).await?;
    Ok(Json(confirmed))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_actor(&payload.actor)?;
    let cancelled = state.lifecycle_service.cancel(&booking_id, payload.actor.trim(), Utc::now()).await?;
    Ok(Json(cancelled))
}

pub async fn settle_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    if booking.status().map_err(AppError::InternalWithMsg)? != BookingStatus::Completed {
        return Err(AppError::Validation("Only completed bookings can be settled".into()));
    }

    let settled = state.settlement_service.settle_booking(&booking.id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    Ok(Json(settled))
}

pub async fn add_service(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    Json(payload): Json<AddServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_actor(&payload.actor)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Service name is required".into()));
    }
    let service_id = payload.service_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let updated = state.lifecycle_service
        .add_service(&booking_id, service_id, payload.name, payload.actor.trim(), Utc::now())
        .await?;
    Ok(Json(updated))
}

pub async fn update_service_status(
    State(state): State<Arc<AppState>>,
    Path((booking_id, service_id)): Path<(String, String)>,
    Json(payload): Json<UpdateServiceStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_actor(&payload.actor)?;
    let updated = state.lifecycle_service
        .change_service_status(&booking_id, &service_id, payload.status, payload.actor.trim(), Utc::now())
        .await?;
    Ok(Json(updated))
}
