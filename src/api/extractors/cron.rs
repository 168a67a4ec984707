use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::warn;

const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Guards the sweep trigger. With no secret configured every caller passes.
pub struct CronAuth;

impl FromRequestParts<Arc<AppState>> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.config.cron_secret.as_deref() else {
            return Ok(CronAuth);
        };

        let authorized = [axum::http::header::AUTHORIZATION.as_str(), CRON_SECRET_HEADER]
            .iter()
            .filter_map(|name| parts.headers.get(*name))
            .filter_map(|value| value.to_str().ok())
            .any(|value| secret_matches(value, secret));

        if authorized {
            Ok(CronAuth)
        } else {
            warn!("Rejected sweep trigger: missing or invalid secret");
            Err(AppError::Unauthorized)
        }
    }
}

/// Accepts the raw secret or a `Bearer <secret>` value.
fn secret_matches(value: &str, secret: &str) -> bool {
    let value = value.trim();
    value == secret || value.strip_prefix("Bearer ").map(str::trim) == Some(secret)
}

#[cfg(test)]
mod tests {
    use super::secret_matches;

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(secret_matches("Bearer s3cret", "s3cret"));
        assert!(secret_matches("  s3cret ", "s3cret"));
        assert!(!secret_matches("Bearer wrong", "s3cret"));
        assert!(!secret_matches("", "s3cret"));
        assert!(!secret_matches("Basic s3cret", "s3cret"));
    }
}
