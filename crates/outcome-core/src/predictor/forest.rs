//! Decision-tree ensemble classifier
//!
//! Trees are stored in flattened array form: node `i` is a leaf when
//! `left[i] == -1`; otherwise `x[feature[i]] <= threshold[i]` descends to
//! `left[i]`, anything else to `right[i]`. Leaf rows of `value` hold per-class
//! weights, normalized before the ensemble averages them.

use serde::{Deserialize, Serialize};

use super::{argmax, check_width, Predictor};
use crate::error::{OutcomeError, Result};

const LEAF: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub left: Vec<i64>,
    pub right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> std::result::Result<(), String> {
        let n = self.left.len();
        if n == 0 {
            return Err("decision tree has no nodes".to_string());
        }
        if [self.right.len(), self.feature.len(), self.threshold.len(), self.value.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err("decision tree arrays differ in length".to_string());
        }

        for i in 0..n {
            if self.left[i] == LEAF {
                if self.right[i] != LEAF {
                    return Err(format!(
                        "decision tree node {} has only one child",
                        i
                    ));
                }
                let row = &self.value[i];
                if row.len() != n_classes {
                    return Err(format!(
                        "leaf {} has {} class weights, expected {}",
                        i,
                        row.len(),
                        n_classes
                    ));
                }
                let total: f64 = row.iter().sum();
                if row.iter().any(|w| !w.is_finite() || *w < 0.0) || total <= 0.0 {
                    return Err(format!(
                        "leaf {} has invalid class weights",
                        i
                    ));
                }
                continue;
            }

            // Children always follow their parent, which rules out cycles.
            let child_ok = |c: i64| c > i as i64 && (c as usize) < n;
            if !child_ok(self.left[i]) || !child_ok(self.right[i]) {
                return Err(format!(
                    "decision tree node {} has out-of-range children",
                    i
                ));
            }
            let feature = self.feature[i];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!(
                    "decision tree node {} splits on feature {} of {}",
                    i, feature, n_features
                ));
            }
            if !self.threshold[i].is_finite() {
                return Err(format!(
                    "decision tree node {} has a non-finite threshold",
                    i
                ));
            }
        }

        Ok(())
    }

    /// Leaf distribution reached by `features`, or `None` when the arrays
    /// do not describe a well-formed tree
    fn leaf(&self, features: &[f64]) -> Option<&[f64]> {
        let mut node = 0usize;
        loop {
            let left = *self.left.get(node)?;
            if left == LEAF {
                return self.value.get(node).map(Vec::as_slice);
            }

            let feature = usize::try_from(*self.feature.get(node)?).ok()?;
            let next = if *features.get(feature)? <= *self.threshold.get(node)? {
                left
            } else {
                *self.right.get(node)?
            };
            if next <= node as i64 {
                return None;
            }
            node = usize::try_from(next).ok()?;
        }
    }
}

/// Averages normalized leaf distributions across trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    pub n_features: usize,
    pub classes: Vec<usize>,
    pub trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    pub fn validate(&self) -> Result<()> {
        if self.n_features == 0 {
            return Err(OutcomeError::inference("forest model has zero input width"));
        }
        if self.classes.is_empty() {
            return Err(OutcomeError::inference("forest model has no classes"));
        }
        if self.trees.is_empty() {
            return Err(OutcomeError::inference("forest model has no trees"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| OutcomeError::inference(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }

    /// Mean class distribution across trees
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        check_width(self.n_features, features)?;

        let mut proba = vec![0.0; self.classes.len()];
        for (i, tree) in self.trees.iter().enumerate() {
            let leaf = tree
                .leaf(features)
                .filter(|leaf| leaf.len() == proba.len())
                .ok_or_else(|| OutcomeError::inference(format!("tree {} is malformed", i)))?;
            let total: f64 = leaf.iter().sum();
            if total.is_nan() || total <= 0.0 {
                return Err(OutcomeError::inference(format!(
                    "tree {} reached a leaf without class weight",
                    i
                )));
            }
            for (p, w) in proba.iter_mut().zip(leaf) {
                *p += w / total;
            }
        }

        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }
}

impl Predictor for ForestClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<usize> {
        let proba = self.predict_proba(features)?;
        argmax(&proba)
            .and_then(|i| self.classes.get(i).copied())
            .ok_or_else(|| OutcomeError::inference("forest model produced no class"))
    }

    fn kind(&self) -> &'static str {
        "forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::ModelArtifact;

    /// Splits on feature 0 at 0.5: left leaf favours class 0, right class 2
    fn stump(left: Vec<f64>, right: Vec<f64>) -> DecisionTree {
        DecisionTree {
            left: vec![1, -1, -1],
            right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![vec![1.0, 1.0, 1.0], left, right],
        }
    }

    fn forest() -> ForestClassifier {
        ForestClassifier {
            n_features: 2,
            classes: vec![0, 1, 2],
            trees: vec![
                stump(vec![8.0, 2.0, 0.0], vec![0.0, 1.0, 9.0]),
                stump(vec![3.0, 1.0, 0.0], vec![0.0, 4.0, 6.0]),
            ],
        }
    }

    #[test]
    fn test_threshold_is_inclusive_left() {
        let f = forest();
        assert_eq!(f.predict(&[0.5, 0.0]).unwrap(), 0);
        assert_eq!(f.predict(&[0.51, 0.0]).unwrap(), 2);
    }

    #[test]
    fn test_proba_is_averaged_and_normalized() {
        let proba = forest().predict_proba(&[0.0, 0.0]).unwrap();
        assert!((proba[0] - 0.775).abs() < 1e-12);
        assert!((proba[1] - 0.225).abs() < 1e-12);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_backward_children() {
        let mut f = forest();
        f.trees[0].left[0] = 0;
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_feature() {
        let mut f = forest();
        f.trees[1].feature[0] = 7;
        let err = f.validate().unwrap_err();
        assert!(err.to_string().contains("tree 1"));
    }

    #[test]
    fn test_validate_rejects_leaf_width() {
        let mut f = forest();
        f.trees[0].value[1] = vec![1.0];
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_width_mismatch() {
        assert!(forest().predict(&[1.0]).is_err());
    }

    #[test]
    fn test_unvalidated_forest_does_not_panic() {
        let mut f = forest();
        f.trees[0].left[0] = 0;
        let err = f.predict(&[0.0, 0.0]).unwrap_err();
        assert!(err.to_string().contains("tree 0"));

        let mut f = forest();
        f.trees[1].feature[0] = 7;
        assert!(f.predict(&[0.0, 0.0]).is_err());

        let mut f = forest();
        f.trees[0].value.truncate(2);
        assert!(f.predict(&[0.9, 0.0]).is_err());

        let mut f = forest();
        f.trees[0].value[1] = vec![0.0, 0.0, 0.0];
        assert!(f.predict(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn test_forest_artifact_from_json() {
        let json = serde_json::json!({
            "kind": "forest",
            "n_features": 2,
            "classes": [0, 1, 2],
            "trees": [{
                "left": [1, -1, -1],
                "right": [2, -1, -1],
                "feature": [1, -2, -2],
                "threshold": [0.0, -2.0, -2.0],
                "value": [[1.0, 1.0, 1.0], [5.0, 1.0, 0.0], [0.0, 1.0, 5.0]]
            }]
        });
        let artifact: ModelArtifact = serde_json::from_value(json).unwrap();
        assert!(matches!(artifact, ModelArtifact::Forest(_)));
        assert_eq!(artifact.classes(), &[0, 1, 2]);

        let predictor = artifact.into_predictor().unwrap();
        assert_eq!(predictor.kind(), "forest");
        assert_eq!(predictor.n_features(), 2);
        assert_eq!(predictor.predict(&[9.0, -1.0]).unwrap(), 0);
        assert_eq!(predictor.predict(&[9.0, 1.0]).unwrap(), 2);
    }
}
