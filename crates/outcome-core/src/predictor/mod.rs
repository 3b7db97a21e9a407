//! Classifier seam
//!
//! The pipeline only relies on the [`Predictor`] trait: a fixed-width vector
//! goes in, a class index comes out. The serialized model artifact selects a
//! concrete implementation through its `kind` tag.

pub mod forest;
pub mod linear;

pub use forest::{DecisionTree, ForestClassifier};
pub use linear::LinearClassifier;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{OutcomeError, Result};

/// A trained classifier
///
/// Implementations must be pure: the same vector always yields the same
/// class index.
#[cfg_attr(test, mockall::automock)]
pub trait Predictor: Send + Sync {
    /// Expected input width
    fn n_features(&self) -> usize;

    /// Predict the class index of one feature vector
    fn predict(&self, features: &[f64]) -> Result<usize>;

    /// Short identifier of the model family
    fn kind(&self) -> &'static str;
}

/// A serialized classifier, tagged by model family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelArtifact {
    Linear(LinearClassifier),
    Forest(ForestClassifier),
}

impl ModelArtifact {
    /// Check internal consistency of the parameters
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelArtifact::Linear(m) => m.validate(),
            ModelArtifact::Forest(m) => m.validate(),
        }
    }

    /// Class indices the model can emit
    pub fn classes(&self) -> &[usize] {
        match self {
            ModelArtifact::Linear(m) => &m.classes,
            ModelArtifact::Forest(m) => &m.classes,
        }
    }

    /// Validate and box as a shared predictor
    pub fn into_predictor(self) -> Result<Arc<dyn Predictor>> {
        self.validate()?;
        Ok(match self {
            ModelArtifact::Linear(m) => Arc::new(m),
            ModelArtifact::Forest(m) => Arc::new(m),
        })
    }
}

/// Reject vectors whose width differs from the model's
pub(crate) fn check_width(expected: usize, features: &[f64]) -> Result<()> {
    if features.len() != expected {
        return Err(OutcomeError::inference(format!(
            "model expects {} features, got {}",
            expected,
            features.len()
        )));
    }
    Ok(())
}

/// Index of the largest score; ties go to the lowest index
pub(crate) fn argmax(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &s) in scores.iter().enumerate() {
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_ties_pick_first() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5]), Some(1));
        assert_eq!(argmax(&[-1.0, -3.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_check_width() {
        assert!(check_width(2, &[1.0, 2.0]).is_ok());
        let err = check_width(3, &[1.0]).unwrap_err();
        assert_eq!(err.to_string(), "Inference error: model expects 3 features, got 1");
    }

    #[test]
    fn test_model_artifact_tagged_by_kind() {
        let json = serde_json::json!({
            "kind": "linear",
            "classes": [0, 1, 2],
            "coefficients": [[1.0], [0.0], [-1.0]],
            "intercepts": [0.0, 0.0, 0.0]
        });
        let artifact: ModelArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(artifact.classes(), &[0, 1, 2]);

        let predictor = artifact.into_predictor().unwrap();
        assert_eq!(predictor.kind(), "linear");
        assert_eq!(predictor.n_features(), 1);
        assert_eq!(predictor.predict(&[5.0]).unwrap(), 0);
        assert_eq!(predictor.predict(&[-5.0]).unwrap(), 2);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = serde_json::json!({ "kind": "svm", "classes": [0] });
        assert!(serde_json::from_value::<ModelArtifact>(json).is_err());
    }
}
