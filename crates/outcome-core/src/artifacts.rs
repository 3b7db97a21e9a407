//! Frozen artifact loading
//!
//! A bundle is four JSON files written by one training run:
//!
//! - `model_columns.json` - ordered feature columns the model was fitted on
//! - `scaler.json` - standard scaler names and parameters
//! - `categories.json` - category vocabulary per categorical field
//! - `model.json` - the classifier, tagged by `kind`
//!
//! Every file carries a `training_run` identifier. Loading fails unless all
//! four agree and the pieces are mutually consistent, so a server never
//! starts with a column list from one run and a model from another.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{OutcomeError, Result};
use crate::label::PredictionLabel;
use crate::pipeline::{CategoryVocabulary, FeaturePipeline, FrozenColumns, StandardScaler};
use crate::predictor::ModelArtifact;

pub const COLUMNS_FILE: &str = "model_columns.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const MODEL_FILE: &str = "model.json";

/// Locations of the four artifact files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub columns: PathBuf,
    pub scaler: PathBuf,
    pub categories: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Standard file names inside one directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            columns: dir.join(COLUMNS_FILE),
            scaler: dir.join(SCALER_FILE),
            categories: dir.join(CATEGORIES_FILE),
            model: dir.join(MODEL_FILE),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Stamped<T> {
    training_run: String,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Deserialize)]
struct ColumnsBody {
    columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CategoriesBody {
    fields: BTreeMap<String, Vec<i64>>,
}

/// Summary of a loaded bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSummary {
    pub training_run: String,
    pub model_kind: String,
    pub width: usize,
    pub scaled_columns: usize,
    pub indicator_columns: usize,
    pub fingerprint: String,
}

/// A consistent set of frozen artifacts
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub training_run: String,
    pub pipeline: FeaturePipeline,
    pub model: ModelArtifact,
    /// SHA-256 over the raw bytes of all four files
    pub fingerprint: String,
}

impl ArtifactBundle {
    /// Load and cross-check a bundle
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let mut hasher = Sha256::new();

        let columns: Stamped<ColumnsBody> = read_stamped(&paths.columns, &mut hasher)?;
        let scaler: Stamped<StandardScaler> = read_stamped(&paths.scaler, &mut hasher)?;
        let categories: Stamped<CategoriesBody> = read_stamped(&paths.categories, &mut hasher)?;
        let model: Stamped<ModelArtifact> = read_stamped(&paths.model, &mut hasher)?;

        let training_run = columns.training_run;
        for (path, run) in [
            (&paths.scaler, &scaler.training_run),
            (&paths.categories, &categories.training_run),
            (&paths.model, &model.training_run),
        ] {
            if *run != training_run {
                return Err(OutcomeError::artifact(
                    path,
                    format!(
                        "training run '{}' does not match '{}' from {}",
                        run,
                        training_run,
                        paths.columns.display()
                    ),
                ));
            }
        }

        let frozen = FrozenColumns::new(columns.body.columns).map_err(at(&paths.columns))?;
        let vocabulary =
            CategoryVocabulary::new(categories.body.fields).map_err(at(&paths.categories))?;
        let pipeline =
            FeaturePipeline::new(vocabulary, frozen, &scaler.body).map_err(at(&paths.scaler))?;

        let model = model.body;
        model.validate().map_err(at(&paths.model))?;
        check_model_fits(&model, &pipeline).map_err(at(&paths.model))?;

        let unproducible = pipeline.unproducible_columns();
        if !unproducible.is_empty() {
            tracing::warn!(
                count = unproducible.len(),
                columns = ?unproducible,
                "Frozen columns can never be populated and will always be zero"
            );
        }

        let bundle = Self {
            training_run,
            pipeline,
            model,
            fingerprint: hex::encode(hasher.finalize()),
        };

        tracing::info!(
            training_run = %bundle.training_run,
            width = bundle.pipeline.width(),
            scaled = bundle.pipeline.scaler().len(),
            kind = bundle.model_kind(),
            fingerprint = %bundle.fingerprint,
            "Loaded artifact bundle"
        );

        Ok(bundle)
    }

    /// Load the standard file names from a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load(&ArtifactPaths::in_dir(dir))
    }

    pub fn model_kind(&self) -> &'static str {
        match self.model {
            ModelArtifact::Linear(_) => "linear",
            ModelArtifact::Forest(_) => "forest",
        }
    }

    pub fn summary(&self) -> BundleSummary {
        BundleSummary {
            training_run: self.training_run.clone(),
            model_kind: self.model_kind().to_string(),
            width: self.pipeline.width(),
            scaled_columns: self.pipeline.scaler().len(),
            indicator_columns: self.pipeline.vocabulary().indicator_columns().len(),
            fingerprint: self.fingerprint.clone(),
        }
    }
}

fn read_stamped<T: DeserializeOwned>(path: &Path, hasher: &mut Sha256) -> Result<Stamped<T>> {
    let bytes = std::fs::read(path)
        .map_err(|e| OutcomeError::artifact(path, format!("cannot read file: {}", e)))?;
    hasher.update(&bytes);
    serde_json::from_slice(&bytes)
        .map_err(|e| OutcomeError::artifact(path, format!("invalid JSON: {}", e)))
}

fn check_model_fits(model: &ModelArtifact, pipeline: &FeaturePipeline) -> Result<()> {
    let width = match model {
        ModelArtifact::Linear(m) => m.coefficients.first().map(Vec::len).unwrap_or(0),
        ModelArtifact::Forest(m) => m.n_features,
    };
    if width != pipeline.width() {
        return Err(OutcomeError::inference(format!(
            "model expects {} features but the column list has {}",
            width,
            pipeline.width()
        )));
    }

    for class in model.classes() {
        PredictionLabel::from_class_index(*class).map_err(|_| {
            OutcomeError::inference(format!("model emits class {} outside the label set", class))
        })?;
    }

    Ok(())
}

/// Attribute a validation failure to the file it came from
fn at(path: &Path) -> impl FnOnce(OutcomeError) -> OutcomeError + '_ {
    move |err| {
        let message = match err {
            OutcomeError::Pipeline(msg) | OutcomeError::Inference(msg) => msg,
            other => other.to_string(),
        };
        OutcomeError::artifact(path, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::categorical_fields;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        std::fs::write(dir.join(name), serde_json::to_vec_pretty(&value).unwrap()).unwrap();
    }

    fn write_bundle(dir: &Path, model_run: &str) {
        let fields: BTreeMap<String, Vec<i64>> = categorical_fields()
            .map(|f| (f.to_string(), vec![0, 1]))
            .collect();
        write(
            dir,
            COLUMNS_FILE,
            json!({ "training_run": "run-1", "columns": ["GDP", "sem1_pass_rate", "Debtor_1"] }),
        );
        write(
            dir,
            SCALER_FILE,
            json!({ "training_run": "run-1", "feature_names_in": ["GDP"], "mean": [1.0], "scale": [2.0] }),
        );
        write(dir, CATEGORIES_FILE, json!({ "training_run": "run-1", "fields": fields }));
        write(
            dir,
            MODEL_FILE,
            json!({
                "training_run": model_run,
                "kind": "linear",
                "classes": [0, 1, 2],
                "coefficients": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                "intercepts": [0.0, 0.0, 0.0]
            }),
        );
    }

    #[test]
    fn test_load_consistent_bundle() {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "run-1");

        let bundle = ArtifactBundle::load_dir(dir.path()).unwrap();
        let summary = bundle.summary();
        assert_eq!(summary.training_run, "run-1");
        assert_eq!(summary.model_kind, "linear");
        assert_eq!(summary.width, 3);
        assert_eq!(summary.scaled_columns, 1);
        assert_eq!(summary.indicator_columns, 17);
        assert_eq!(summary.fingerprint.len(), 64);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "run-1");
        let a = ArtifactBundle::load_dir(dir.path()).unwrap();
        let b = ArtifactBundle::load_dir(dir.path()).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_mismatched_training_run_rejected() {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "run-2");

        let err = ArtifactBundle::load_dir(dir.path()).unwrap_err();
        let OutcomeError::Artifact { path, message } = err else {
            panic!("expected artifact error");
        };
        assert!(path.ends_with(MODEL_FILE));
        assert!(message.contains("run-2"));
    }

    #[test]
    fn test_missing_file_rejected() {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "run-1");
        std::fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();

        let err = ArtifactBundle::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains(SCALER_FILE));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_scaler_column_outside_list_rejected() {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "run-1");
        write(
            dir.path(),
            SCALER_FILE,
            json!({ "training_run": "run-1", "feature_names_in": ["Admission grade"], "mean": [0.0], "scale": [1.0] }),
        );

        let err = ArtifactBundle::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Admission grade"));
    }

    #[test]
    fn test_model_width_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "run-1");
        write(
            dir.path(),
            MODEL_FILE,
            json!({
                "training_run": "run-1",
                "kind": "linear",
                "classes": [0, 1, 2],
                "coefficients": [[1.0], [0.0], [-1.0]],
                "intercepts": [0.0, 0.0, 0.0]
            }),
        );

        let err = ArtifactBundle::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("expects 1 features"));
    }

    #[test]
    fn test_model_class_outside_labels_rejected() {
        let dir = TempDir::new().unwrap();
        write_bundle(dir.path(), "run-1");
        write(
            dir.path(),
            MODEL_FILE,
            json!({
                "training_run": "run-1",
                "kind": "linear",
                "classes": [0, 1, 5],
                "coefficients": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                "intercepts": [0.0, 0.0, 0.0]
            }),
        );

        let err = ArtifactBundle::load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("class 5"));
    }
}
