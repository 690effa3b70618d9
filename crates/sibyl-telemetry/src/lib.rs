//! # Sibyl Telemetry
//!
//! Observability for the Sibyl retrieval service: structured logging
//! setup and a lightweight operation timer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod logging;
pub mod timer;

pub use logging::init_logging;
pub use timer::Timer;

/// Configuration for telemetry.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to startup events.
    pub service_name: String,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Enable JSON-formatted logs.
    pub json_logs: bool,
}

impl TelemetryConfig {
    /// Creates a new telemetry configuration.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Sets the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enables JSON logging.
    #[must_use]
    pub fn with_json_logs(mut self) -> Self {
        self.json_logs = true;
        self
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new("sibyl")
    }
}
