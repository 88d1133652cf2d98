use crate::models::duration::parse_duration;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub service_name: String,
    /// Seconds between SLA evaluation passes.
    pub evaluation_interval_secs: i64,
    /// Seconds between automation passes (auto-close etc.).
    pub automation_interval_secs: i64,
    /// UTC hour (0-23) at which the daily absence sweep runs.
    pub sweep_hour_utc: u32,
    /// Tickets resolved longer than this ago are auto-closed.
    pub auto_close_after_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://slawatch.db?mode=rwc".to_string());

        let service_name = env::var("SERVICE_NAME").unwrap_or_else(|_| "slawatch".to_string());

        let evaluation_interval_secs = match env::var("SLA_EVAL_INTERVAL") {
            Ok(v) => parse_duration(&v).map_err(ConfigError::InvalidDuration)?,
            Err(_) => 60,
        };

        let automation_interval_secs = match env::var("AUTOMATION_INTERVAL") {
            Ok(v) => parse_duration(&v).map_err(ConfigError::InvalidDuration)?,
            Err(_) => 3600,
        };

        let sweep_hour_utc = env::var("SWEEP_HOUR_UTC")
            .unwrap_or_else(|_| "2".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidSweepHour)?;
        if sweep_hour_utc > 23 {
            return Err(ConfigError::InvalidSweepHour);
        }

        let auto_close_after_secs = match env::var("AUTO_CLOSE_AFTER") {
            Ok(v) => parse_duration(&v).map_err(ConfigError::InvalidDuration)?,
            Err(_) => 7 * 24 * 3600,
        };

        Ok(Config {
            database_url,
            service_name,
            evaluation_interval_secs,
            automation_interval_secs,
            sweep_hour_utc,
            auto_close_after_secs,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("SWEEP_HOUR_UTC must be an hour between 0 and 23")]
    InvalidSweepHour,
}
