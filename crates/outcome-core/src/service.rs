//! Prediction service
//!
//! Composes validation, the feature pipeline and a predictor. Holds only
//! read-only state, so one instance is shared across all requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::artifacts::{ArtifactBundle, ArtifactPaths, BundleSummary};
use crate::error::{OutcomeError, Result};
use crate::label::PredictionLabel;
use crate::pipeline::FeaturePipeline;
use crate::predictor::Predictor;
use crate::schema::{validate_record, StudentRecord};

/// Outcome of one prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: PredictionLabel,
    pub class_index: usize,
}

pub struct PredictionService {
    pipeline: FeaturePipeline,
    predictor: Arc<dyn Predictor>,
    summary: Option<BundleSummary>,
}

impl PredictionService {
    /// Pair a pipeline with a predictor of the same width
    pub fn new(pipeline: FeaturePipeline, predictor: Arc<dyn Predictor>) -> Result<Self> {
        if predictor.n_features() != pipeline.width() {
            return Err(OutcomeError::inference(format!(
                "{} predictor expects {} features but the pipeline produces {}",
                predictor.kind(),
                predictor.n_features(),
                pipeline.width()
            )));
        }

        Ok(Self {
            pipeline,
            predictor,
            summary: None,
        })
    }

    pub fn from_bundle(bundle: ArtifactBundle) -> Result<Self> {
        let summary = bundle.summary();
        let predictor = bundle.model.into_predictor()?;
        let mut service = Self::new(bundle.pipeline, predictor)?;
        service.summary = Some(summary);
        Ok(service)
    }

    /// Load a bundle from disk and build a service from it
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        Self::from_bundle(ArtifactBundle::load(paths)?)
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn model_kind(&self) -> &'static str {
        self.predictor.kind()
    }

    /// Bundle metadata, when the service was built from disk
    pub fn summary(&self) -> Option<&BundleSummary> {
        self.summary.as_ref()
    }

    /// Validate a raw JSON record and predict its outcome
    ///
    /// No pipeline stage runs unless the record validates.
    pub fn predict_json(&self, value: &Value) -> Result<Prediction> {
        let record = validate_record(value)?;
        self.predict(&record)
    }

    /// Predict the outcome of a validated record
    pub fn predict(&self, record: &StudentRecord) -> Result<Prediction> {
        let scaled = self.pipeline.transform(record)?;
        let class_index = self.predictor.predict(scaled.values())?;
        let label = PredictionLabel::from_class_index(class_index)?;

        tracing::debug!(class_index, label = %label, "Prediction complete");

        Ok(Prediction { label, class_index })
    }
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("width", &self.pipeline.width())
            .field("model_kind", &self.predictor.kind())
            .field("summary", &self.summary)
            .finish()
    }
}
