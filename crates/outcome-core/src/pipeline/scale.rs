//! Standard scaling with frozen parameters

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{OutcomeError, Result};

use super::align::{AlignedVector, FrozenColumns};

/// Pre-fitted standard scaler
///
/// Each fitted column is transformed as `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Columns the scaler was fitted on, in parameter order
    pub feature_names_in: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn validate(&self) -> Result<()> {
        let n = self.feature_names_in.len();
        if self.mean.len() != n || self.scale.len() != n {
            return Err(OutcomeError::pipeline(format!(
                "scaler has {} features but {} means and {} scales",
                n,
                self.mean.len(),
                self.scale.len()
            )));
        }

        for (i, name) in self.feature_names_in.iter().enumerate() {
            if !self.mean[i].is_finite() {
                return Err(OutcomeError::pipeline(format!(
                    "scaler mean for '{}' is not finite",
                    name
                )));
            }
            if !self.scale[i].is_finite() || self.scale[i] == 0.0 {
                return Err(OutcomeError::pipeline(format!(
                    "scaler scale for '{}' must be finite and non-zero",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// A scaler bound to positions in the frozen column list
#[derive(Debug, Clone, PartialEq)]
pub struct ScalerPlan {
    columns: Arc<[String]>,
    steps: Arc<[ScaleStep]>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScaleStep {
    position: usize,
    mean: f64,
    scale: f64,
}

impl ScalerPlan {
    /// Resolve every fitted column against the frozen list
    pub fn new(scaler: &StandardScaler, columns: &FrozenColumns) -> Result<Self> {
        scaler.validate()?;

        let steps = scaler
            .feature_names_in
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let position = columns.position(name).ok_or_else(|| {
                    OutcomeError::pipeline(format!(
                        "scaler column '{}' is not in the frozen column list",
                        name
                    ))
                })?;
                Ok(ScaleStep {
                    position,
                    mean: scaler.mean[i],
                    scale: scaler.scale[i],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            columns: columns.shared_names(),
            steps: steps.into(),
        })
    }

    /// Number of columns this plan scales
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Standardize the fitted columns; every other column passes through
    ///
    /// The vector must be aligned to the same frozen columns the plan was
    /// built against.
    pub fn apply(&self, aligned: AlignedVector) -> Result<ScaledVector> {
        let (columns, mut values) = aligned.into_parts();

        if !Arc::ptr_eq(&columns, &self.columns) && columns[..] != self.columns[..] {
            return Err(OutcomeError::pipeline(format!(
                "vector has {} columns that do not match the {} frozen columns of the scaler",
                columns.len(),
                self.columns.len()
            )));
        }

        for step in self.steps.iter() {
            let x = values[step.position];
            values[step.position] = (x - step.mean) / step.scale;
        }

        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(OutcomeError::pipeline(format!(
                "feature '{}' is not finite after scaling",
                columns[i]
            )));
        }

        Ok(ScaledVector { columns, values })
    }
}

/// Model-ready feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledVector {
    columns: Arc<[String]>,
    values: Vec<f64>,
}

impl ScaledVector {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen() -> FrozenColumns {
        FrozenColumns::new(vec!["a".into(), "b".into(), "c".into()]).unwrap()
    }

    fn aligned(values: Vec<f64>) -> AlignedVector {
        AlignedVector::from_parts(frozen().names().to_vec().into(), values)
    }

    fn scaler(names: &[&str], mean: Vec<f64>, scale: Vec<f64>) -> StandardScaler {
        StandardScaler {
            feature_names_in: names.iter().map(|n| n.to_string()).collect(),
            mean,
            scale,
        }
    }

    #[test]
    fn test_scales_only_fitted_columns() {
        let plan = ScalerPlan::new(&scaler(&["c", "a"], vec![10.0, 1.0], vec![2.0, 0.5]), &frozen())
            .unwrap();
        let scaled = plan.apply(aligned(vec![2.0, 7.0, 14.0])).unwrap();
        assert_eq!(scaled.values(), &[2.0, 7.0, 2.0]);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_unknown_scaler_column_rejected() {
        let err = ScalerPlan::new(&scaler(&["z"], vec![0.0], vec![1.0]), &frozen()).unwrap_err();
        assert!(err.to_string().contains("'z'"));
    }

    #[test]
    fn test_parameter_lengths_checked() {
        assert!(scaler(&["a", "b"], vec![0.0], vec![1.0, 1.0]).validate().is_err());
        assert!(scaler(&["a"], vec![0.0], vec![0.0]).validate().is_err());
        assert!(scaler(&["a"], vec![f64::NAN], vec![1.0]).validate().is_err());
    }

    #[test]
    fn test_foreign_vector_rejected() {
        let plan = ScalerPlan::new(&scaler(&["c"], vec![0.0], vec![1.0]), &frozen()).unwrap();
        let short = AlignedVector::from_parts(
            vec!["a".to_string(), "b".to_string()].into(),
            vec![1.0, 2.0],
        );
        let err = plan.apply(short).unwrap_err();
        assert!(err.to_string().contains("do not match"));

        let renamed = AlignedVector::from_parts(
            vec!["a".to_string(), "b".to_string(), "d".to_string()].into(),
            vec![1.0, 2.0, 3.0],
        );
        assert!(plan.apply(renamed).is_err());
    }

    #[test]
    fn test_non_finite_output_rejected() {
        let plan = ScalerPlan::new(&scaler(&["a"], vec![0.0], vec![1e-300]), &frozen()).unwrap();
        let err = plan.apply(aligned(vec![1e300, 0.0, 0.0])).unwrap_err();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("'a'"));
    }
}
