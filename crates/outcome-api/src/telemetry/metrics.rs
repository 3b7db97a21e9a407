//! Prometheus metrics for the prediction server
//!
//! - `outcome_requests_total` (counter) - requests by endpoint and status
//! - `outcome_predictions_total` (counter) - predictions by label
//! - `outcome_validation_failures_total` (counter) - field violations by code
//! - `outcome_inference_duration_seconds` (histogram) - pipeline plus model time
//! - `outcome_model_info` (gauge) - loaded training run and model kind

use prometheus::{
    CounterVec, Encoder, GaugeVec, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::time::Instant;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "outcome";

pub struct ServiceMetrics {
    registry: Registry,
    requests_total: CounterVec,
    predictions_total: CounterVec,
    validation_failures_total: CounterVec,
    inference_duration_seconds: Histogram,
    model_info: GaugeVec,
}

impl ServiceMetrics {
    /// Create the metrics on a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("requests_total", "Total HTTP requests handled").namespace(NAMESPACE),
            &["endpoint", "status"],
        )?;

        let predictions_total = CounterVec::new(
            Opts::new("predictions_total", "Predictions returned by label").namespace(NAMESPACE),
            &["label"],
        )?;

        let validation_failures_total = CounterVec::new(
            Opts::new(
                "validation_failures_total",
                "Field-level validation failures by violation code",
            )
            .namespace(NAMESPACE),
            &["code"],
        )?;

        let inference_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "inference_duration_seconds",
                "Time spent in the feature pipeline and model",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1]),
        )?;

        let model_info = GaugeVec::new(
            Opts::new("model_info", "Loaded model artifacts").namespace(NAMESPACE),
            &["training_run", "kind"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(predictions_total.clone()))?;
        registry.register(Box::new(validation_failures_total.clone()))?;
        registry.register(Box::new(inference_duration_seconds.clone()))?;
        registry.register(Box::new(model_info.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            predictions_total,
            validation_failures_total,
            inference_duration_seconds,
            model_info,
        })
    }

    pub fn record_request(&self, endpoint: &str, status: u16) {
        self.requests_total
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();
    }

    pub fn record_prediction(&self, label: &str) {
        self.predictions_total.with_label_values(&[label]).inc();
    }

    pub fn record_validation_failure(&self, code: &str) {
        self.validation_failures_total
            .with_label_values(&[code])
            .inc();
    }

    pub fn set_model_info(&self, training_run: &str, kind: &str) {
        self.model_info.with_label_values(&[training_run, kind]).set(1.0);
    }

    /// Start an inference timer (records on drop)
    pub fn start_timer(&self) -> InferenceTimer<'_> {
        InferenceTimer {
            start: Instant::now(),
            metrics: self,
        }
    }

    /// Render the registry in the text exposition format
    pub fn gather(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| TelemetryError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::EncodingFailed(e.to_string()))
    }
}

/// RAII guard for timing inference
pub struct InferenceTimer<'a> {
    start: Instant,
    metrics: &'a ServiceMetrics,
}

impl Drop for InferenceTimer<'_> {
    fn drop(&mut self) {
        self.metrics
            .inference_duration_seconds
            .observe(self.start.elapsed().as_secs_f64());
    }
}
