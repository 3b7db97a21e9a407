//! HTTP prediction server for student outcome classification
//!
//! Wraps [`outcome_core::PredictionService`] in an axum router with request
//! ids, structured logging and Prometheus metrics.
//!
//! ```rust,no_run
//! use outcome_api::{create_router, AppState, ServiceConfig};
//! use outcome_core::PredictionService;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ServiceConfig::default();
//! let service = PredictionService::load(&config.artifacts.paths())?;
//! let state = AppState::new(Arc::new(service), None);
//! let router = create_router(state, config.server.max_body_bytes);
//!
//! let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod handler;
pub mod telemetry;

pub use config::{ConfigError, LogFormat, ServiceConfig};
pub use handler::{create_router, ApiError, AppState};
pub use telemetry::{init_tracing, ServiceMetrics, TelemetryError};
