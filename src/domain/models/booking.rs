use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;

pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// COMPLETED is reachable only through the lifecycle sweep, never through a direct request.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, ServiceStatus::Pending | ServiceStatus::Confirmed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatusChange {
    pub status: ServiceStatus,
    pub at: DateTime<Utc>,
    pub by: String,
}

/// An extra paid service attached to a stay (airport pickup, tour guide, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalService {
    pub service_id: String,
    pub name: String,
    pub status: ServiceStatus,
    #[serde(default)]
    pub history: Vec<ServiceStatusChange>,
}

impl AdditionalService {
    pub fn new(service_id: String, name: String, actor: &str, now: DateTime<Utc>) -> Self {
        Self {
            service_id,
            name,
            status: ServiceStatus::Pending,
            history: vec![ServiceStatusChange {
                status: ServiceStatus::Pending,
                at: now,
                by: actor.to_string(),
            }],
        }
    }

    /// Applies a host/guest status change. Completion is reserved for the sweep.
    pub fn change_status(&mut self, next: ServiceStatus, actor: &str, now: DateTime<Utc>) -> Result<(), String> {
        let allowed = matches!(
            (self.status, next),
            (ServiceStatus::Pending, ServiceStatus::Confirmed)
                | (ServiceStatus::Pending, ServiceStatus::Cancelled)
                | (ServiceStatus::Confirmed, ServiceStatus::Cancelled)
        );
        if !allowed {
            return Err(format!(
                "Service {} cannot move from {:?} to {:?}",
                self.service_id, self.status, next
            ));
        }
        self.record(next, actor, now);
        Ok(())
    }

    fn record(&mut self, status: ServiceStatus, actor: &str, now: DateTime<Utc>) {
        self.status = status;
        self.history.push(ServiceStatusChange {
            status,
            at: now,
            by: actor.to_string(),
        });
    }
}

/// Moves every open service to `target`, appending one history entry per changed
/// service. Returns how many services changed.
pub fn close_open_services(
    services: &mut [AdditionalService],
    target: ServiceStatus,
    actor: &str,
    now: DateTime<Utc>,
) -> usize {
    let mut changed = 0;
    for service in services.iter_mut().filter(|s| s.status.is_open()) {
        service.record(target, actor, now);
        changed += 1;
    }
    changed
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub listing_id: String,
    pub guest_id: String,
    pub host_id: String,
    pub status: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub total_price: i64,
    pub service_fee: i64,
    pub platform_commission: i64,
    pub host_earnings: i64,
    pub host_payout_status: Option<String>,
    pub host_payout_settled_at: Option<DateTime<Utc>>,
    pub additional_services: Json<Vec<AdditionalService>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub listing_id: String,
    pub guest_id: String,
    pub host_id: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub total_price: i64,
    pub service_fee: i64,
    pub additional_services: Vec<AdditionalService>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            listing_id: params.listing_id,
            guest_id: params.guest_id,
            host_id: params.host_id,
            status: BookingStatus::Pending.as_str().to_string(),
            check_in: params.check_in,
            check_out: params.check_out,
            total_price: params.total_price,
            service_fee: params.service_fee,
            platform_commission: 0,
            host_earnings: 0,
            host_payout_status: None,
            host_payout_settled_at: None,
            additional_services: Json(params.additional_services),
            completed_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> Result<BookingStatus, String> {
        self.status.parse()
    }

    /// The explicit marker wins; non-zero amounts cover rows settled before the marker existed.
    pub fn is_settled(&self) -> bool {
        self.host_payout_settled_at.is_some() || self.platform_commission > 0 || self.host_earnings > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_transitions() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Completed));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled));
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Confirmed));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Cancelled));
        assert_eq!("CONFIRMED".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert!("confirmed".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_close_open_services_leaves_finished_services_alone() {
        let t0 = Utc::now() - Duration::days(2);
        let now = Utc::now();

        let pending = AdditionalService::new("s1".into(), "Airport pickup".into(), "guest-1", t0);
        let mut done = AdditionalService::new("s2".into(), "Breakfast".into(), "guest-1", t0);
        done.record(ServiceStatus::Completed, "host-1", t0);

        let mut services = vec![pending, done.clone()];
        let changed = close_open_services(&mut services, ServiceStatus::Completed, SYSTEM_ACTOR, now);

        assert_eq!(changed, 1);
        assert_eq!(services[0].status, ServiceStatus::Completed);
        assert_eq!(services[0].history.len(), 2);
        assert_eq!(services[0].history[1].by, SYSTEM_ACTOR);
        assert_eq!(services[0].history[1].at, now);
        assert_eq!(services[1], done);
    }

    #[test]
    fn test_service_cannot_be_completed_by_users() {
        let mut service = AdditionalService::new("s1".into(), "Tour".into(), "guest-1", Utc::now());
        assert!(service.change_status(ServiceStatus::Completed, "host-1", Utc::now()).is_err());
        assert!(service.change_status(ServiceStatus::Confirmed, "host-1", Utc::now()).is_ok());
        assert!(service.change_status(ServiceStatus::Cancelled, "guest-1", Utc::now()).is_ok());
        assert!(service.change_status(ServiceStatus::Confirmed, "host-1", Utc::now()).is_err());
        assert_eq!(service.history.len(), 3);
    }

    #[test]
    fn test_service_schema_rejects_unknown_status() {
        let raw = r#"{"service_id":"s1","name":"Tour","status":"DONE","history":[]}"#;
        assert!(serde_json::from_str::<AdditionalService>(raw).is_err());
    }
}
