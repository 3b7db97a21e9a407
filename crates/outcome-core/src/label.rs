//! Prediction labels

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OutcomeError, Result};

/// Academic outcome predicted for a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionLabel {
    Dropout,
    Enrolled,
    Graduate,
}

impl PredictionLabel {
    /// All labels, indexed by class
    pub const ALL: [PredictionLabel; 3] = [
        PredictionLabel::Dropout,
        PredictionLabel::Enrolled,
        PredictionLabel::Graduate,
    ];

    /// Map a classifier output to its label
    pub fn from_class_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(OutcomeError::UnknownClass(index))
    }

    pub fn class_index(&self) -> usize {
        match self {
            PredictionLabel::Dropout => 0,
            PredictionLabel::Enrolled => 1,
            PredictionLabel::Graduate => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionLabel::Dropout => "Dropout",
            PredictionLabel::Enrolled => "Enrolled",
            PredictionLabel::Graduate => "Graduate",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_mapping() {
        assert_eq!(PredictionLabel::from_class_index(0).unwrap(), PredictionLabel::Dropout);
        assert_eq!(PredictionLabel::from_class_index(1).unwrap(), PredictionLabel::Enrolled);
        assert_eq!(PredictionLabel::from_class_index(2).unwrap(), PredictionLabel::Graduate);
        for label in PredictionLabel::ALL {
            assert_eq!(PredictionLabel::from_class_index(label.class_index()).unwrap(), label);
        }
    }

    #[test]
    fn test_unknown_class_is_internal() {
        let err = PredictionLabel::from_class_index(3).unwrap_err();
        assert!(matches!(err, OutcomeError::UnknownClass(3)));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_serializes_as_name() {
        assert_eq!(
            serde_json::to_string(&PredictionLabel::Graduate).unwrap(),
            "\"Graduate\""
        );
        assert_eq!(PredictionLabel::Enrolled.to_string(), "Enrolled");
    }
}
