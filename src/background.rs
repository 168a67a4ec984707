use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, warn, info_span, Instrument};
use crate::state::AppState;

pub async fn start_background_worker(state: Arc<AppState>) {
    let interval_secs = state.config.sweep_interval_secs;
    if interval_secs == 0 {
        info!("Scheduled booking sweep disabled (SWEEP_INTERVAL_SECS=0)");
        return;
    }

    info!("Starting booking sweep worker, interval {}s...", interval_secs);

    loop {
        let span = info_span!("booking_sweep", trigger = "schedule");
        let lifecycle = state.lifecycle_service.clone();

        async move {
            match lifecycle.run_sweep(Utc::now()).await {
                Ok(report) if report.failed.is_empty() => {
                    info!("Scheduled sweep completed {} bookings", report.completed);
                }
                Ok(report) => {
                    warn!(
                        failed = report.failed.len(),
                        "Scheduled sweep completed {} bookings with failures",
                        report.completed
                    );
                }
                Err(e) => error!("Scheduled sweep could not run: {:?}", e),
            }
        }
            .instrument(span)
            .await;

        sleep(Duration::from_secs(interval_secs)).await;
    }
}
