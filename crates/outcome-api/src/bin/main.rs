//! Student outcome prediction server entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use outcome_api::{create_router, init_tracing, AppState, ServiceConfig, ServiceMetrics};
use outcome_core::{ArtifactBundle, BundleSummary, OutcomeError, PredictionService};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "outcome-server")]
#[command(about = "Student outcome prediction server")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "OUTCOME_CONFIG")]
    config: Option<PathBuf>,

    /// Artifact directory
    #[arg(short, long, global = true, env = "OUTCOME_ARTIFACTS")]
    artifacts: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load artifacts and start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// Load and cross-check the artifact bundle
    Check,

    /// Predict one record from a JSON file
    Predict {
        /// Path to the record file
        #[arg(short, long)]
        record: PathBuf,
    },
}

/// Output of `check`, one shape for success and failure
#[derive(Serialize)]
struct CheckReport {
    valid: bool,
    #[serde(flatten)]
    summary: Option<BundleSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CheckReport {
    fn valid(summary: BundleSummary) -> Self {
        Self {
            valid: true,
            summary: Some(summary),
            error: None,
        }
    }

    fn invalid(err: &OutcomeError) -> Self {
        Self {
            valid: false,
            summary: None,
            error: Some(err.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.artifacts {
        config.artifacts.dir = dir;
    }
    if let Commands::Serve { port, host } = &cli.command {
        if let Some(port) = port {
            config.server.port = *port;
        }
        if let Some(host) = host {
            config.server.host = host.clone();
        }
    }
    config.validate()?;

    init_tracing(config.telemetry.log_format)?;

    match cli.command {
        Commands::Serve { .. } => serve(config).await?,

        Commands::Check => {
            let report = match ArtifactBundle::load(&config.artifacts.paths()) {
                Ok(bundle) => CheckReport::valid(bundle.summary()),
                Err(err) => CheckReport::invalid(&err),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.valid {
                std::process::exit(1);
            }
        }

        Commands::Predict { record } => {
            let service = PredictionService::load(&config.artifacts.paths())?;
            let content = std::fs::read_to_string(&record)
                .with_context(|| format!("Failed to read {}", record.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)?;

            match service.predict_json(&value) {
                Ok(prediction) => {
                    println!("{}", serde_json::json!({ "prediction": prediction.label }));
                }
                Err(OutcomeError::Validation(violations)) => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({ "violations": violations }))?
                    );
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let service = PredictionService::load(&config.artifacts.paths())
        .context("Failed to load model artifacts")?;
    let metrics = if config.telemetry.metrics_enabled {
        Some(Arc::new(ServiceMetrics::new()?))
    } else {
        None
    };

    let state = AppState::new(Arc::new(service), metrics);
    let router = create_router(state, config.server.max_body_bytes);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        version = env!("CARGO_PKG_VERSION"),
        metrics = config.telemetry.metrics_enabled,
        "Prediction server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
