use std::env;
use crate::domain::services::settlement::{DEFAULT_COMMISSION_RATE_BPS, MAX_COMMISSION_RATE_BPS};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cron_secret: Option<String>, // None leaves the sweep trigger open
    pub commission_rate_bps: i64,
    pub sweep_interval_secs: u64,    // 0 disables the scheduled sweep
    pub sweep_booking_timeout_secs: u64,
    pub log_dir: String,
    pub log_file: String,
    pub log_filter: String,          // filter for the JSON file layer
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            cron_secret: env::var("CRON_SECRET").ok().filter(|s| !s.trim().is_empty()),
            commission_rate_bps: env::var("COMMISSION_RATE_BPS")
                .map(|v| parse_commission_rate(&v).expect("Invalid COMMISSION_RATE_BPS"))
                .unwrap_or(DEFAULT_COMMISSION_RATE_BPS),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .map(|v| v.parse().expect("SWEEP_INTERVAL_SECS must be a number"))
                .unwrap_or(3600),
            sweep_booking_timeout_secs: env::var("SWEEP_BOOKING_TIMEOUT_SECS")
                .map(|v| v.parse().expect("SWEEP_BOOKING_TIMEOUT_SECS must be a number"))
                .unwrap_or(30),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "homestay-service.log".to_string()),
            log_filter: env::var("LOG_FILTER").unwrap_or_else(|_| "info,homestay_backend=debug".to_string()),
        }
    }
}

/// Basis points of the total price, between 0% and 100%.
fn parse_commission_rate(raw: &str) -> Result<i64, String> {
    let bps: i64 = raw.trim().parse().map_err(|_| format!("{} is not a number", raw))?;
    if !(0..=MAX_COMMISSION_RATE_BPS).contains(&bps) {
        return Err(format!("{} is outside 0..={} basis points", bps, MAX_COMMISSION_RATE_BPS));
    }
    Ok(bps)
}

#[cfg(test)]
mod tests {
    use super::parse_commission_rate;

    #[test]
    fn test_commission_rate_bounds() {
        assert_eq!(parse_commission_rate("1000"), Ok(1_000));
        assert_eq!(parse_commission_rate("0"), Ok(0));
        assert_eq!(parse_commission_rate("10000"), Ok(10_000));
        assert!(parse_commission_rate("10001").is_err());
        assert!(parse_commission_rate("20000").is_err());
        assert!(parse_commission_rate("-1").is_err());
        assert!(parse_commission_rate("ten").is_err());
    }
}
