use crate::domain::models::booking::ServiceStatus;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateListingRequest {
    pub host_id: String,
    pub title: String,
}

#[derive(Deserialize)]
pub struct NewServiceRequest {
    pub service_id: Option<String>,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub listing_id: String,
    pub guest_id: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub total_price: i64,
    pub service_fee: Option<i64>,
    #[serde(default)]
    pub additional_services: Vec<NewServiceRequest>,
}

#[derive(Deserialize)]
pub struct CancelBookingRequest {
    pub actor: String,
}

#[derive(Deserialize)]
pub struct AddServiceRequest {
    pub service_id: Option<String>,
    pub name: String,
    pub actor: String,
}

#[derive(Deserialize)]
pub struct UpdateServiceStatusRequest {
    pub status: ServiceStatus,
    pub actor: String,
}

#[derive(Deserialize)]
pub struct PayoutRequest {
    pub amount: i64,
    pub note: Option<String>,
}
