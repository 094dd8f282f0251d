//! Application configuration loaded from environment variables.

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `REDELIVERY_ATTEMPTS` — delivery attempts per inbound event,
///   including the first (default: `3`)
/// - `REDELIVERY_INTERVAL_SECS` — seconds between redeliveries
///   (default: `5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub redelivery_attempts: u32,
    pub redelivery_interval_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            redelivery_attempts: std::env::var("REDELIVERY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.redelivery_attempts),
            redelivery_interval_secs: std::env::var("REDELIVERY_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.redelivery_interval_secs),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the transport redelivery policy for inbound events.
    pub fn retry_policy(&self) -> saga_engine::RetryPolicy {
        saga_engine::RetryPolicy::new(
            self.redelivery_attempts,
            std::time::Duration::from_secs(self.redelivery_interval_secs),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            redelivery_attempts: 3,
            redelivery_interval_secs: 5,
        }
    }
}
