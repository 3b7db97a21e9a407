//! Multinomial linear classifier

use serde::{Deserialize, Serialize};

use super::{argmax, check_width, Predictor};
use crate::error::{OutcomeError, Result};

/// `argmax(W·x + b)` over one coefficient row per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    /// Class index emitted for each coefficient row
    pub classes: Vec<usize>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearClassifier {
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(OutcomeError::inference("linear model has no classes"));
        }
        if self.coefficients.len() != self.classes.len()
            || self.intercepts.len() != self.classes.len()
        {
            return Err(OutcomeError::inference(format!(
                "linear model has {} classes, {} coefficient rows and {} intercepts",
                self.classes.len(),
                self.coefficients.len(),
                self.intercepts.len()
            )));
        }

        let width = self.coefficients[0].len();
        if width == 0 {
            return Err(OutcomeError::inference("linear model has zero-width coefficients"));
        }
        if self.coefficients.iter().any(|row| row.len() != width) {
            return Err(OutcomeError::inference("linear model coefficient rows differ in width"));
        }

        let finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(self.intercepts.iter())
            .all(|v| v.is_finite());
        if !finite {
            return Err(OutcomeError::inference("linear model has non-finite parameters"));
        }

        Ok(())
    }
}

impl Predictor for LinearClassifier {
    fn n_features(&self) -> usize {
        self.coefficients.first().map(Vec::len).unwrap_or(0)
    }

    fn predict(&self, features: &[f64]) -> Result<usize> {
        check_width(self.n_features(), features)?;

        let scores: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        argmax(&scores)
            .and_then(|i| self.classes.get(i).copied())
            .ok_or_else(|| OutcomeError::inference("linear model produced no class"))
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}
