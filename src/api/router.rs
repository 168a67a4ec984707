use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, listing, booking, host, cron};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Scheduled sweep trigger
        .route("/api/cron/complete-bookings", post(cron::complete_bookings).get(cron::complete_bookings))

        // Listings
        .route("/api/v1/listings", post(listing::create_listing))
        .route("/api/v1/listings/{listing_id}", get(listing::get_listing))

        // Bookings
        .route("/api/v1/bookings", post(booking::create_booking))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/bookings/{booking_id}/confirm", post(booking::confirm_booking))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/bookings/{booking_id}/settle", post(booking::settle_booking))
        .route("/api/v1/bookings/{booking_id}/services", post(booking::add_service))
        .route("/api/v1/bookings/{booking_id}/services/{service_id}", put(booking::update_service_status))

        // Host dashboard
        .route("/api/v1/hosts/{host_id}/bookings", get(host::list_host_bookings))
        .route("/api/v1/hosts/{host_id}/balance", get(host::get_balance))
        .route("/api/v1/hosts/{host_id}/transactions", get(host::list_transactions))
        .route("/api/v1/hosts/{host_id}/payouts", post(host::request_payout))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
