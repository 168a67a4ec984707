use homestay_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::models::{
        booking::{AdditionalService, Booking, BookingStatus, NewBookingParams},
        listing::Listing,
    },
    infra::repositories::{
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_listing_repo::SqliteListingRepo,
        sqlite_ledger_repo::SqliteLedgerRepo,
    },
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use chrono::{DateTime, Utc};
use tower::ServiceExt;
use serde_json::Value;

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
pub struct SeedBooking<'a> {
    pub listing: &'a Listing,
    pub guest_id: &'a str,
    pub status: BookingStatus,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub total_price: i64,
    pub service_fee: i64,
    pub additional_services: Vec<AdditionalService>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_cron_secret(None).await
    }

    pub async fn with_cron_secret(secret: Option<&str>) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            cron_secret: secret.map(str::to_string),
            commission_rate_bps: 1_000,
            sweep_interval_secs: 0,
            sweep_booking_timeout_secs: 10,
            log_dir: "./logs".to_string(),
            log_file: "homestay-test.log".to_string(),
            log_filter: "info".to_string(),
        };

        let state = Arc::new(AppState::new(
            config,
            Arc::new(SqliteListingRepo::new(pool.clone())),
            Arc::new(SqliteBookingRepo::new(pool.clone())),
            Arc::new(SqliteLedgerRepo::new(pool.clone())),
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    pub async fn seed_listing(&self, host_id: &str, title: &str) -> Listing {
        let listing = Listing::new(host_id.to_string(), title.to_string());
        self.state.listing_repo.create(&listing).await.unwrap()
    }

    pub async fn seed_booking(&self, seed: SeedBooking<'_>) -> Booking {
        let mut booking = Booking::new(NewBookingParams {
            listing_id: seed.listing.id.clone(),
            guest_id: seed.guest_id.to_string(),
            host_id: seed.listing.host_id.clone(),
            check_in: seed.check_in,
            check_out: seed.check_out,
            total_price: seed.total_price,
            service_fee: seed.service_fee,
            additional_services: seed.additional_services,
        });
        booking.status = seed.status.as_str().to_string();
        self.state.booking_repo.create(&booking).await.unwrap()
    }

    pub async fn booking(&self, id: &str) -> Booking {
        self.state.booking_repo.find_by_id(id).await.unwrap().expect("booking should exist")
    }

    pub async fn count_transactions(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
