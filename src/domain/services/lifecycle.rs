use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, info_span, warn, Instrument};

use crate::domain::models::booking::{
    close_open_services, AdditionalService, Booking, BookingStatus, ServiceStatus, SYSTEM_ACTOR,
};
use crate::domain::ports::BookingRepository;
use crate::domain::services::settlement::SettlementService;
use crate::error::AppError;

const RESETTLE_BATCH: i64 = 50;

#[derive(Debug, Serialize, Clone)]
pub struct SweepFailure {
    pub booking_id: String,
    pub error: String,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct SweepReport {
    /// Bookings moved to COMPLETED and settled by this run.
    pub completed: usize,
    /// Bookings another sweep claimed first.
    pub skipped: usize,
    /// Previously completed bookings whose settlement was retried successfully.
    pub resettled: usize,
    pub failed: Vec<SweepFailure>,
}

enum SweepOutcome {
    Settled,
    Skipped,
}

pub struct LifecycleService {
    booking_repo: Arc<dyn BookingRepository>,
    settlement: Arc<SettlementService>,
    booking_timeout: Duration,
}

impl LifecycleService {
    pub fn new(booking_repo: Arc<dyn BookingRepository>, settlement: Arc<SettlementService>, booking_timeout: Duration) -> Self {
        Self { booking_repo, settlement, booking_timeout }
    }

    async fn load(&self, booking_id: &str) -> Result<(Booking, BookingStatus), AppError> {
        let booking = self.booking_repo.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        let status = booking.status().map_err(AppError::InternalWithMsg)?;
        Ok((booking, status))
    }

    pub async fn confirm(&self, booking_id: &str, now: DateTime<Utc>) -> Result<Booking, AppError> {
        let (booking, status) = self.load(booking_id).await?;
        if status == BookingStatus::Confirmed {
            return Ok(booking);
        }
        if !status.can_transition_to(BookingStatus::Confirmed) {
            return Err(AppError::Validation(format!("Cannot confirm a {} booking", status)));
        }

        let confirmed = self.booking_repo
            .transition(&booking.id, status, booking.updated_at, BookingStatus::Confirmed, &booking.additional_services, now)
            .await?
            .ok_or(AppError::Conflict("Booking was modified concurrently, retry".into()))?;
        info!("Booking {} confirmed", confirmed.id);
        Ok(confirmed)
    }

    pub async fn cancel(&self, booking_id: &str, actor: &str, now: DateTime<Utc>) -> Result<Booking, AppError> {
        let (booking, status) = self.load(booking_id).await?;
        if status == BookingStatus::Cancelled {
            return Ok(booking);
        }
        if !status.can_transition_to(BookingStatus::Cancelled) {
            return Err(AppError::Validation(format!("Cannot cancel a {} booking", status)));
        }
        if status == BookingStatus::Confirmed && booking.check_out <= now {
            return Err(AppError::Validation("Stay has already ended".into()));
        }

        let mut services = booking.additional_services.0.clone();
        close_open_services(&mut services, ServiceStatus::Cancelled, actor, now);

        let cancelled = self.booking_repo
            .transition(&booking.id, status, booking.updated_at, BookingStatus::Cancelled, &services, now)
            .await?
            .ok_or(AppError::Conflict("Booking was modified concurrently, retry".into()))?;
        info!("Booking {} cancelled by {}", cancelled.id, actor);
        Ok(cancelled)
    }

    pub async fn add_service(
        &self,
        booking_id: &str,
        service_id: String,
        name: String,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let (booking, status) = self.load(booking_id).await?;
        if status.is_terminal() {
            return Err(AppError::Validation(format!("Cannot add services to a {} booking", status)));
        }
        if booking.additional_services.iter().any(|s| s.service_id == service_id) {
            return Err(AppError::Conflict(format!("Service {} already exists on booking", service_id)));
        }

        let mut services = booking.additional_services.0.clone();
        services.push(AdditionalService::new(service_id, name, actor, now));
        self.store_services(&booking, &services, now).await
    }

    pub async fn change_service_status(
        &self,
        booking_id: &str,
        service_id: &str,
        next: ServiceStatus,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let (booking, status) = self.load(booking_id).await?;
        if status.is_terminal() {
            return Err(AppError::Validation(format!("Cannot change services of a {} booking", status)));
        }

        let mut services = booking.additional_services.0.clone();
        let service = services.iter_mut()
            .find(|s| s.service_id == service_id)
            .ok_or(AppError::NotFound(format!("Service {} not found", service_id)))?;
        service.change_status(next, actor, now).map_err(AppError::Validation)?;

        self.store_services(&booking, &services, now).await
    }

    async fn store_services(&self, booking: &Booking, services: &[AdditionalService], now: DateTime<Utc>) -> Result<Booking, AppError> {
        self.booking_repo
            .update_services(&booking.id, booking.updated_at, services, now)
            .await?
            .ok_or(AppError::Conflict("Booking was modified concurrently, retry".into()))
    }

    /// Completes every CONFIRMED booking past checkout and settles it.
    ///
    /// Bookings run concurrently, each under its own timeout. Only the initial query can
    /// fail the sweep; per-booking errors land in the report.
    pub async fn run_sweep(self: Arc<Self>, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
        let due = self.booking_repo.find_due_for_completion(now).await?;
        info!(due = due.len(), "Starting booking sweep");

        let mut report = SweepReport::default();
        let mut attempted = HashSet::new();
        let mut tasks = JoinSet::new();
        let mut task_bookings = HashMap::new();

        for booking in due {
            attempted.insert(booking.id.clone());
            let booking_id = booking.id.clone();
            let span = info_span!("booking_settlement", booking_id = %booking.id);
            let service = self.clone();
            let handle = tasks.spawn(
                async move {
                    match timeout(service.booking_timeout, service.complete_and_settle(booking, now)).await {
                        Ok(result) => result,
                        Err(_) => Err(AppError::Timeout(format!("gave up after {:?}", service.booking_timeout))),
                    }
                }
                .instrument(span),
            );
            task_bookings.insert(handle.id(), booking_id);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, Ok(SweepOutcome::Settled))) => report.completed += 1,
                Ok((_, Ok(SweepOutcome::Skipped))) => report.skipped += 1,
                Ok((task_id, Err(e))) => {
                    let booking_id = task_bookings.remove(&task_id).unwrap_or_default();
                    error!("Sweep failed for booking {}: {}", booking_id, e);
                    report.failed.push(SweepFailure { booking_id, error: e.to_string() });
                }
                Err(join_err) => {
                    let booking_id = task_bookings.remove(&join_err.id()).unwrap_or_default();
                    error!("Sweep task for booking {} panicked: {}", booking_id, join_err);
                    report.failed.push(SweepFailure { booking_id, error: "task aborted".to_string() });
                }
            }
        }

        self.resettle_completed(&attempted, &mut report).await;

        info!(
            completed = report.completed,
            skipped = report.skipped,
            resettled = report.resettled,
            failed = report.failed.len(),
            "Booking sweep finished"
        );
        Ok(report)
    }

    async fn complete_and_settle(&self, booking: Booking, now: DateTime<Utc>) -> Result<SweepOutcome, AppError> {
        let Some(completed) = self.claim_completion(&booking, now).await? else {
            warn!("Booking {} left CONFIRMED before this sweep could claim it", booking.id);
            return Ok(SweepOutcome::Skipped);
        };

        match self.settlement.settle_booking(&completed.id).await? {
            Some(_) => Ok(SweepOutcome::Settled),
            None => Ok(SweepOutcome::Skipped),
        }
    }

    /// Marks a due booking COMPLETED. When its services were edited after the sweep read it,
    /// the row is read again once so the newer service list is the one that gets closed.
    async fn claim_completion(&self, booking: &Booking, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        if let Some(completed) = self.try_complete(booking, now).await? {
            return Ok(Some(completed));
        }

        let Some(current) = self.booking_repo.find_by_id(&booking.id).await? else {
            return Ok(None);
        };
        let still_due = current.status().map_err(AppError::InternalWithMsg)? == BookingStatus::Confirmed
            && current.check_out <= now;
        if !still_due || current.updated_at == booking.updated_at {
            return Ok(None);
        }

        info!("Booking {} changed after the sweep read it, retrying with the current services", booking.id);
        self.try_complete(&current, now).await
    }

    async fn try_complete(&self, booking: &Booking, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let mut services = booking.additional_services.0.clone();
        let closed = close_open_services(&mut services, ServiceStatus::Completed, SYSTEM_ACTOR, now);

        let completed = self.booking_repo
            .transition(&booking.id, BookingStatus::Confirmed, booking.updated_at, BookingStatus::Completed, &services, now)
            .await?;
        if let Some(completed) = &completed {
            info!(services_closed = closed, "Booking {} marked completed", completed.id);
        }
        Ok(completed)
    }

    /// Retries settlement for bookings completed by an earlier run whose settlement never landed.
    async fn resettle_completed(self: Arc<Self>, attempted: &HashSet<String>, report: &mut SweepReport) {
        let pending = match self.booking_repo.find_unsettled_completed(RESETTLE_BATCH).await {
            Ok(bookings) => bookings,
            Err(e) => {
                error!("Could not load unsettled completed bookings: {}", e);
                return;
            }
        };

        let mut tasks = JoinSet::new();
        for booking in pending.into_iter().filter(|b| !attempted.contains(&b.id)) {
            let span = info_span!("booking_settlement", booking_id = %booking.id, retry = true);
            let service = self.clone();
            tasks.spawn(
                async move {
                    let result = match timeout(service.booking_timeout, service.settlement.settle_booking(&booking.id)).await {
                        Ok(result) => result,
                        Err(_) => Err(AppError::Timeout(format!("gave up after {:?}", service.booking_timeout))),
                    };
                    (booking.id, result)
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(Some(_)))) => report.resettled += 1,
                Ok((_, Ok(None))) => {}
                Ok((booking_id, Err(e))) => {
                    error!("Settlement retry failed for booking {}: {}", booking_id, e);
                    report.failed.push(SweepFailure { booking_id, error: e.to_string() });
                }
                Err(join_err) => {
                    error!("Settlement retry task aborted: {}", join_err);
                }
            }
        }
    }
}
