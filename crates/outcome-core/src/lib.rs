//! Student outcome prediction core
//!
//! Validates raw student records, reproduces the frozen training-time feature
//! pipeline and invokes a pre-trained classifier.
//!
//! ## Architecture
//!
//! 1. **Schema** (`schema`): the 36-field record and its validator.
//! 2. **Pipeline** (`pipeline`): derived features, indicator expansion,
//!    column alignment and standard scaling.
//! 3. **Artifacts** (`artifacts`): loads and cross-checks the frozen column
//!    list, scaler, vocabulary and model from one training run.
//! 4. **Predictor** (`predictor`): the classifier seam and its linear and
//!    tree-ensemble implementations.
//! 5. **Service** (`service`): composes the above behind one call.
//!
//! ## Example
//!
//! ```rust,no_run
//! use outcome_core::{ArtifactPaths, PredictionService};
//!
//! let service = PredictionService::load(&ArtifactPaths::in_dir("artifacts")).unwrap();
//! let record = serde_json::from_str(&std::fs::read_to_string("student.json").unwrap()).unwrap();
//! let prediction = service.predict_json(&record).unwrap();
//! println!("{}", prediction.label);
//! ```

pub mod artifacts;
pub mod error;
pub mod label;
pub mod pipeline;
pub mod predictor;
pub mod schema;
pub mod service;

pub use artifacts::{ArtifactBundle, ArtifactPaths, BundleSummary};
pub use error::{FieldViolation, OutcomeError, Result};
pub use label::PredictionLabel;
pub use pipeline::{
    AlignedVector, CategoryVocabulary, FeaturePipeline, FrozenColumns, ScaledVector,
    StandardScaler,
};
pub use predictor::{ForestClassifier, LinearClassifier, ModelArtifact, Predictor};
pub use schema::{validate_record, FieldKind, FieldSpec, StudentRecord, FIELDS};
pub use service::{Prediction, PredictionService};
