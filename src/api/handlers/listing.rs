use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::requests::CreateListingRequest;
use crate::domain::models::listing::Listing;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.host_id.trim().is_empty() || payload.title.trim().is_empty() {
        return Err(AppError::Validation("host_id and title are required".into()));
    }
    let listing = Listing::new(payload.host_id, payload.title.trim().to_string());
    let created = state.listing_repo.create(&listing).await?;
    info!("Created listing {} for host {}", created.id, created.host_id);
    Ok(Json(created))
}

pub async fn get_listing(
    State(state): State<Arc<AppState>>,
    Path(listing_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let listing = state.listing_repo.find_by_id(&listing_id).await?
        .ok_or(AppError::NotFound("Listing not found".into()))?;
    Ok(Json(listing))
}
