//! # P2FK Telemetry
//!
//! Logging and metrics for the P2FK node.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, console or JSON
//! - **Metrics**: Prometheus counters and gauges in a per-node registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use p2fk_telemetry::{init_logging, Metrics, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! let metrics = Metrics::new()?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `P2FK_SERVICE_NAME` | `p2fk-node` | Service name in logs |
//! | `P2FK_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` wins) |
//! | `P2FK_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `P2FK_JSON_LOGS` | `false`, `true` in containers | JSON log lines |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::Metrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
