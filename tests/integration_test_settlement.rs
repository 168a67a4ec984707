mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{SeedBooking, TestApp};
use homestay_backend::domain::models::{booking::{BookingStatus, NewBookingParams, Booking}, listing::Listing};
use std::sync::Arc;
use tokio::task::JoinSet;

fn completed_stay<'a>(listing: &'a Listing, total_price: i64, service_fee: i64) -> SeedBooking<'a> {
    let check_out = Utc::now() - Duration::days(1);
    SeedBooking {
        listing,
        guest_id: "guest-1",
        status: BookingStatus::Completed,
        check_in: check_out - Duration::days(2),
        check_out,
        total_price,
        service_fee,
        additional_services: vec![],
    }
}

#[tokio::test]
async fn test_default_commission_split() {
    let app = TestApp::new().await;
    let listing = app.seed_listing("host-1", "Riverside Homestay").await;
    let booking = app.seed_booking(completed_stay(&listing, 1_000_000, 0)).await;

    let settled = app.state.settlement_service.settle_booking(&booking.id).await.unwrap().unwrap();

    assert_eq!(settled.platform_commission, 100_000);
    assert_eq!(settled.host_earnings, 900_000);
    assert_eq!(settled.host_payout_status.as_deref(), Some("PENDING"));
    assert!(settled.host_payout_settled_at.is_some());
    assert_eq!(settled.platform_commission + settled.host_earnings, settled.total_price);

    let profile = app.state.ledger_repo.find_host_profile("host-1").await.unwrap().unwrap();
    assert_eq!(profile.total_earnings, 900_000);
    assert_eq!(profile.available_balance, 900_000);

    let ledger = app.state.ledger_repo.list_transactions("host-1").await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].transaction_type, "BOOKING_PAYMENT");
    assert_eq!(ledger[0].amount, 900_000);
    assert_eq!(ledger[0].status, "COMPLETED");
    assert_eq!(ledger[0].description, "Payment for booking: Riverside Homestay");
    assert_eq!(ledger[0].reference_id.as_deref(), Some(booking.id.as_str()));
}

#[tokio::test]
async fn test_service_fee_is_the_commission() {
    let app = TestApp::new().await;
    let listing = app.seed_listing("host-1", "Hill Villa").await;
    let booking = app.seed_booking(completed_stay(&listing, 1_000_000, 150_000)).await;

    let settled = app.state.settlement_service.settle_booking(&booking.id).await.unwrap().unwrap();

    assert_eq!(settled.platform_commission, 150_000);
    assert_eq!(settled.host_earnings, 850_000);
    let profile = app.state.ledger_repo.find_host_profile("host-1").await.unwrap().unwrap();
    assert_eq!(profile.available_balance, 850_000);
}

#[tokio::test]
async fn test_recorded_commission_means_already_settled() {
    let app = TestApp::new().await;
    let listing = app.seed_listing("host-1", "Old Quarter Loft").await;

    let check_out = Utc::now() - Duration::days(1);
    let mut legacy = Booking::new(NewBookingParams {
        listing_id: listing.id.clone(),
        guest_id: "guest-1".into(),
        host_id: listing.host_id.clone(),
        check_in: check_out - Duration::days(1),
        check_out,
        total_price: 1_000_000,
        service_fee: 0,
        additional_services: vec![],
    });
    legacy.status = "COMPLETED".into();
    legacy.platform_commission = 100_000;
    let legacy = app.state.booking_repo.create(&legacy).await.unwrap();

    let result = app.state.settlement_service.settle_booking(&legacy.id).await.unwrap().unwrap();

    assert_eq!(result.platform_commission, 100_000);
    assert_eq!(result.host_earnings, 0);
    assert!(result.host_payout_settled_at.is_none());
    assert_eq!(result.updated_at, legacy.updated_at);
    assert_eq!(app.count_transactions().await, 0);
    assert!(app.state.ledger_repo.find_host_profile("host-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_settlement_is_idempotent() {
    let app = TestApp::new().await;
    let listing = app.seed_listing("host-1", "Beach House").await;
    let booking = app.seed_booking(completed_stay(&listing, 1_000_000, 0)).await;

    let first = app.state.settlement_service.settle_booking(&booking.id).await.unwrap().unwrap();
    let second = app.state.settlement_service.settle_booking(&booking.id).await.unwrap().unwrap();

    assert_eq!(first.platform_commission, second.platform_commission);
    assert_eq!(first.host_earnings, second.host_earnings);
    assert_eq!(first.host_payout_settled_at, second.host_payout_settled_at);

    let profile = app.state.ledger_repo.find_host_profile("host-1").await.unwrap().unwrap();
    assert_eq!(profile.total_earnings, 900_000);
    assert_eq!(profile.available_balance, 900_000);
    assert_eq!(app.count_transactions().await, 1);
}

#[tokio::test]
async fn test_unknown_booking_is_a_no_op() {
    let app = TestApp::new().await;

    let result = app.state.settlement_service.settle_booking("does-not-exist").await.unwrap();

    assert!(result.is_none());
    assert_eq!(app.count_transactions().await, 0);
}

#[tokio::test]
async fn test_concurrent_settlements_accumulate_host_balance() {
    let app = TestApp::new().await;
    let listing = app.seed_listing("host-1", "Garden Bungalow").await;

    let prices = [1_000_000_i64, 2_500_000, 730_000, 420_000];
    let mut ids = Vec::new();
    let mut expected = 0;
    for price in prices {
        let booking = app.seed_booking(completed_stay(&listing, price, 0)).await;
        expected += price - price / 10;
        ids.push(booking.id);
    }
    // The first booking is settled twice in parallel; it must only be credited once.
    ids.push(ids[0].clone());

    let settlement = app.state.settlement_service.clone();
    let mut set = JoinSet::new();
    for id in ids {
        let settlement = Arc::clone(&settlement);
        set.spawn(async move { settlement.settle_booking(&id).await });
    }
    while let Some(res) = set.join_next().await {
        assert!(res.unwrap().unwrap().is_some());
    }

    let profile = app.state.ledger_repo.find_host_profile("host-1").await.unwrap().unwrap();
    assert_eq!(profile.total_earnings, expected);
    assert_eq!(profile.available_balance, expected);
    assert_eq!(app.count_transactions().await, prices.len() as i64);

    let ledger_sum: i64 = app.state.ledger_repo.list_transactions("host-1").await.unwrap()
        .iter().map(|t| t.amount).sum();
    assert_eq!(ledger_sum, expected);
}

#[tokio::test]
async fn test_missing_listing_uses_generic_description() {
    let app = TestApp::new().await;
    let ghost = Listing::new("host-9".into(), "Removed listing".into());
    let booking = app.seed_booking(completed_stay(&ghost, 500_000, 0)).await;

    app.state.settlement_service.settle_booking(&booking.id).await.unwrap().unwrap();

    let ledger = app.state.ledger_repo.list_transactions("host-9").await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].description, "Payment for booking");
    assert_eq!(ledger[0].amount, 450_000);
}

#[tokio::test]
async fn test_zero_host_share_is_settled_once() {
    let app = TestApp::new().await;
    let listing = app.seed_listing("host-1", "Promo Room").await;
    let booking = app.seed_booking(completed_stay(&listing, 0, 0)).await;

    let first = app.state.settlement_service.settle_booking(&booking.id).await.unwrap().unwrap();
    assert_eq!(first.platform_commission, 0);
    assert_eq!(first.host_earnings, 0);
    assert!(first.host_payout_settled_at.is_some());

    app.state.settlement_service.settle_booking(&booking.id).await.unwrap().unwrap();

    assert_eq!(app.count_transactions().await, 1);
    let profile = app.state.ledger_repo.find_host_profile("host-1").await.unwrap().unwrap();
    assert_eq!(profile.total_earnings, 0);
}

#[tokio::test]
async fn test_settle_endpoint() {
    let app = TestApp::new().await;
    let listing = app.seed_listing("host-1", "City Studio").await;
    let completed = app.seed_booking(completed_stay(&listing, 1_000_000, 0)).await;

    let mut upcoming = completed_stay(&listing, 800_000, 0);
    upcoming.status = BookingStatus::Confirmed;
    upcoming.check_in = Utc::now() + Duration::days(3);
    upcoming.check_out = Utc::now() + Duration::days(5);
    let upcoming = app.seed_booking(upcoming).await;

    let (status, body) = app.request("POST", &format!("/api/v1/bookings/{}/settle", completed.id), None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["platform_commission"], 100_000);
    assert_eq!(body["host_earnings"], 900_000);
    assert_eq!(body["host_payout_status"], "PENDING");

    let (status, _) = app.request("POST", &format!("/api/v1/bookings/{}/settle", upcoming.id), None, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.booking(&upcoming.id).await.host_earnings, 0);

    let (status, body) = app.request("POST", "/api/v1/bookings/nope/settle", None, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Booking not found");
}
