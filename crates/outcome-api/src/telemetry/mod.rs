//! Telemetry for the prediction server
//!
//! - `metrics` - Prometheus counters and histograms for request handling
//! - `init_tracing` - process-wide tracing subscriber

pub mod metrics;

pub use metrics::ServiceMetrics;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Failed to encode metrics: {0}")]
    EncodingFailed(String),

    #[error("Failed to initialize tracing: {0}")]
    TracingInit(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Install the global subscriber
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Events go to
/// stderr so command output on stdout stays machine-readable.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .map_err(|e| TelemetryError::TracingInit(e.to_string()))
}
