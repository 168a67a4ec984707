use crate::domain::services::lifecycle::SweepReport;
use serde::Serialize;

#[derive(Serialize)]
pub struct SweepResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: SweepReport,
}
