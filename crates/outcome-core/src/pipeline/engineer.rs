//! Derived feature computation
//!
//! Four fixed arithmetic rules over the raw record. The two rate features
//! are zero whenever first-semester enrollment is zero.

use serde::{Deserialize, Serialize};

use crate::schema::StudentRecord;

pub const SEM1_PASS_RATE: &str = "sem1_pass_rate";
pub const SEM1_EVAL_COMPLETION_RATE: &str = "sem1_eval_completion_rate";
pub const IS_MATURE_STUDENT: &str = "is_mature_student";
pub const FINANCIAL_STRAIN: &str = "financial_strain";

/// Column names of the derived features, in the order they are appended
pub const DERIVED_COLUMNS: [&str; 4] = [
    SEM1_PASS_RATE,
    SEM1_EVAL_COMPLETION_RATE,
    IS_MATURE_STUDENT,
    FINANCIAL_STRAIN,
];

/// Students strictly older than this at enrollment are mature
pub const MATURE_AGE_THRESHOLD: i64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    pub sem1_pass_rate: f64,
    pub sem1_eval_completion_rate: f64,
    pub is_mature_student: u8,
    pub financial_strain: u8,
}

impl DerivedFeatures {
    pub fn compute(record: &StudentRecord) -> Self {
        Self {
            sem1_pass_rate: ratio_or_zero(record.sem1_approved, record.sem1_enrolled),
            sem1_eval_completion_rate: ratio_or_zero(
                record.sem1_evaluations,
                record.sem1_enrolled,
            ),
            is_mature_student: u8::from(record.age_at_enrollment > MATURE_AGE_THRESHOLD),
            financial_strain: u8::from(
                record.debtor == 1 && record.tuition_fees_up_to_date == 0,
            ),
        }
    }

    /// Named values in [`DERIVED_COLUMNS`] order
    pub fn columns(&self) -> [(&'static str, f64); 4] {
        [
            (SEM1_PASS_RATE, self.sem1_pass_rate),
            (SEM1_EVAL_COMPLETION_RATE, self.sem1_eval_completion_rate),
            (IS_MATURE_STUDENT, f64::from(self.is_mature_student)),
            (FINANCIAL_STRAIN, f64::from(self.financial_strain)),
        ]
    }
}

/// The raw record together with its derived features
#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredRecord {
    pub record: StudentRecord,
    pub derived: DerivedFeatures,
}

impl EngineeredRecord {
    pub fn new(record: StudentRecord) -> Self {
        let derived = DerivedFeatures::compute(&record);
        Self { record, derived }
    }
}

fn ratio_or_zero(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, FIELDS};
    use serde_json::{json, Map, Value};

    fn record_with(overrides: &[(&str, Value)]) -> StudentRecord {
        let mut map = Map::new();
        for spec in FIELDS.iter() {
            let v = match spec.kind {
                FieldKind::Integer => json!(0),
                FieldKind::Float => json!(0.0),
            };
            map.insert(spec.name.to_string(), v);
        }
        for (name, value) in overrides {
            map.insert(name.to_string(), value.clone());
        }
        StudentRecord::from_json(&Value::Object(map)).unwrap()
    }

    #[test]
    fn test_zero_enrolled_yields_zero_rates() {
        let record = record_with(&[
            ("Curricular units 1st sem (enrolled)", json!(0)),
            ("Curricular units 1st sem (approved)", json!(4)),
            ("Curricular units 1st sem (evaluations)", json!(0)),
        ]);
        let derived = DerivedFeatures::compute(&record);
        assert_eq!(derived.sem1_pass_rate, 0.0);
        assert_eq!(derived.sem1_eval_completion_rate, 0.0);
    }

    #[test]
    fn test_rates() {
        let record = record_with(&[
            ("Curricular units 1st sem (enrolled)", json!(6)),
            ("Curricular units 1st sem (approved)", json!(3)),
            ("Curricular units 1st sem (evaluations)", json!(9)),
        ]);
        let derived = DerivedFeatures::compute(&record);
        assert_eq!(derived.sem1_pass_rate, 0.5);
        assert_eq!(derived.sem1_eval_completion_rate, 1.5);
    }

    #[test]
    fn test_mature_student_boundary() {
        let at = |age: i64| {
            DerivedFeatures::compute(&record_with(&[("Age at enrollment", json!(age))]))
                .is_mature_student
        };
        assert_eq!(at(25), 0);
        assert_eq!(at(26), 1);
        assert_eq!(at(17), 0);
    }

    #[test]
    fn test_financial_strain_truth_table() {
        let strain = |debtor: i64, tuition: i64| {
            DerivedFeatures::compute(&record_with(&[
                ("Debtor", json!(debtor)),
                ("Tuition fees up to date", json!(tuition)),
            ]))
            .financial_strain
        };
        assert_eq!(strain(1, 0), 1);
        assert_eq!(strain(1, 1), 0);
        assert_eq!(strain(0, 0), 0);
        assert_eq!(strain(0, 1), 0);
    }

    #[test]
    fn test_columns_order_matches_constant() {
        let derived = DerivedFeatures::compute(&record_with(&[]));
        let names: Vec<_> = derived.columns().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, DERIVED_COLUMNS.to_vec());
    }
}
