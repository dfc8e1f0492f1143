use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub auth_secret: String,
    pub event_buffer_size: usize,
    /// Upper bound on concurrent per-candidate price computations during a
    /// vehicle search.
    pub search_concurrency: usize,
    pub search_limit: usize,
    /// Candidates farther than this from the pickup are not offered.
    /// Unbounded unless an operator sets MAX_PICKUP_DISTANCE_KM.
    pub max_pickup_distance_km: f64,
    /// Assumed average speed used for delivery-time estimates.
    pub average_speed_kmh: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            auth_secret: env::var("AUTH_SECRET")
                .unwrap_or_else(|_| "haulmatch-dev-secret".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            search_concurrency: parse_or_default("SEARCH_CONCURRENCY", 16)?,
            search_limit: parse_or_default("SEARCH_LIMIT", 20)?,
            max_pickup_distance_km: parse_or_default("MAX_PICKUP_DISTANCE_KM", f64::INFINITY)?,
            average_speed_kmh: parse_or_default("AVERAGE_SPEED_KMH", 40.0)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would silently corrupt quotes or matching:
    /// a non-positive speed makes every delivery estimate infinite, and a
    /// non-positive radius would filter out every candidate.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.average_speed_kmh > 0.0) || !self.average_speed_kmh.is_finite() {
            return Err(AppError::Internal(format!(
                "AVERAGE_SPEED_KMH must be a positive finite number, got {}",
                self.average_speed_kmh
            )));
        }
        if !(self.max_pickup_distance_km > 0.0) {
            return Err(AppError::Internal(format!(
                "MAX_PICKUP_DISTANCE_KM must be positive, got {}",
                self.max_pickup_distance_km
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            auth_secret: "haulmatch-dev-secret".to_string(),
            event_buffer_size: 1024,
            search_concurrency: 16,
            search_limit: 20,
            max_pickup_distance_km: f64::INFINITY,
            average_speed_kmh: 40.0,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
