//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter used when `RUST_LOG` is unset
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON instead of human-readable lines
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "p2fk-node".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `P2FK_SERVICE_NAME`: Service name (default: p2fk-node)
    /// - `P2FK_LOG_LEVEL`: Log level (default: info)
    /// - `P2FK_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `P2FK_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        Self::from_lookup(|key| env::var(key).ok(), is_container)
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F, is_container: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            service_name: lookup("P2FK_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("P2FK_LOG_LEVEL").unwrap_or(defaults.log_level),
            console_output: lookup("P2FK_CONSOLE_OUTPUT")
                .map(|v| !(v.eq_ignore_ascii_case("false") || v == "0"))
                .unwrap_or(defaults.console_output),
            json_logs: lookup("P2FK_JSON_LOGS")
                .map(|v| flag(&v))
                .unwrap_or(is_container),
        }
    }
}
