//! Student record schema and validation
//!
//! The record is a fixed set of 36 numeric fields addressed by their exact
//! wire names. Validation walks the field table once, coerces every value to
//! its declared type and collects every violation before giving up, so a
//! caller sees all offending fields in one response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FieldViolation, OutcomeError, Result};

/// Declared type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Float,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
        }
    }
}

/// One entry of the field table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Exact wire name, case and punctuation sensitive
    pub name: &'static str,
    pub kind: FieldKind,
    /// Expanded into indicator columns by the pipeline
    pub categorical: bool,
}

const fn int(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Integer, categorical: false }
}

const fn cat(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Integer, categorical: true }
}

const fn float(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Float, categorical: false }
}

pub const MARITAL_STATUS: &str = "Marital status";
pub const APPLICATION_MODE: &str = "Application mode";
pub const APPLICATION_ORDER: &str = "Application order";
pub const COURSE: &str = "Course";
pub const ATTENDANCE: &str = "Daytime/evening attendance";
pub const PREVIOUS_QUALIFICATION: &str = "Previous qualification";
pub const PREVIOUS_QUALIFICATION_GRADE: &str = "Previous qualification (grade)";
pub const NATIONALITY: &str = "Nacionality";
pub const MOTHER_QUALIFICATION: &str = "Mother's qualification";
pub const FATHER_QUALIFICATION: &str = "Father's qualification";
pub const MOTHER_OCCUPATION: &str = "Mother's occupation";
pub const FATHER_OCCUPATION: &str = "Father's occupation";
pub const ADMISSION_GRADE: &str = "Admission grade";
pub const DISPLACED: &str = "Displaced";
pub const SPECIAL_NEEDS: &str = "Educational special needs";
pub const DEBTOR: &str = "Debtor";
pub const TUITION_UP_TO_DATE: &str = "Tuition fees up to date";
pub const GENDER: &str = "Gender";
pub const SCHOLARSHIP_HOLDER: &str = "Scholarship holder";
pub const AGE_AT_ENROLLMENT: &str = "Age at enrollment";
pub const INTERNATIONAL: &str = "International";
pub const SEM1_CREDITED: &str = "Curricular units 1st sem (credited)";
pub const SEM1_ENROLLED: &str = "Curricular units 1st sem (enrolled)";
pub const SEM1_EVALUATIONS: &str = "Curricular units 1st sem (evaluations)";
pub const SEM1_APPROVED: &str = "Curricular units 1st sem (approved)";
pub const SEM1_GRADE: &str = "Curricular units 1st sem (grade)";
pub const SEM1_WITHOUT_EVALUATIONS: &str = "Curricular units 1st sem (without evaluations)";
pub const SEM2_CREDITED: &str = "Curricular units 2nd sem (credited)";
pub const SEM2_ENROLLED: &str = "Curricular units 2nd sem (enrolled)";
pub const SEM2_EVALUATIONS: &str = "Curricular units 2nd sem (evaluations)";
pub const SEM2_APPROVED: &str = "Curricular units 2nd sem (approved)";
pub const SEM2_GRADE: &str = "Curricular units 2nd sem (grade)";
pub const SEM2_WITHOUT_EVALUATIONS: &str = "Curricular units 2nd sem (without evaluations)";
pub const UNEMPLOYMENT_RATE: &str = "Unemployment rate";
pub const INFLATION_RATE: &str = "Inflation rate";
pub const GDP: &str = "GDP";

/// Every record field, in dataset order
pub const FIELDS: [FieldSpec; 36] = [
    cat(MARITAL_STATUS),
    cat(APPLICATION_MODE),
    int(APPLICATION_ORDER),
    cat(COURSE),
    cat(ATTENDANCE),
    cat(PREVIOUS_QUALIFICATION),
    float(PREVIOUS_QUALIFICATION_GRADE),
    cat(NATIONALITY),
    cat(MOTHER_QUALIFICATION),
    cat(FATHER_QUALIFICATION),
    cat(MOTHER_OCCUPATION),
    cat(FATHER_OCCUPATION),
    float(ADMISSION_GRADE),
    cat(DISPLACED),
    cat(SPECIAL_NEEDS),
    cat(DEBTOR),
    cat(TUITION_UP_TO_DATE),
    cat(GENDER),
    cat(SCHOLARSHIP_HOLDER),
    int(AGE_AT_ENROLLMENT),
    cat(INTERNATIONAL),
    int(SEM1_CREDITED),
    int(SEM1_ENROLLED),
    int(SEM1_EVALUATIONS),
    int(SEM1_APPROVED),
    float(SEM1_GRADE),
    int(SEM1_WITHOUT_EVALUATIONS),
    int(SEM2_CREDITED),
    int(SEM2_ENROLLED),
    int(SEM2_EVALUATIONS),
    int(SEM2_APPROVED),
    float(SEM2_GRADE),
    int(SEM2_WITHOUT_EVALUATIONS),
    float(UNEMPLOYMENT_RATE),
    float(INFLATION_RATE),
    float(GDP),
];

/// Look up a field by its wire name
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Wire names of the categorical fields, in dataset order
pub fn categorical_fields() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().filter(|f| f.categorical).map(|f| f.name)
}

/// A typed field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            FieldValue::Integer(v) => v as f64,
            FieldValue::Float(v) => v,
        }
    }
}

/// One validated student record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(rename = "Marital status")]
    pub marital_status: i64,
    #[serde(rename = "Application mode")]
    pub application_mode: i64,
    #[serde(rename = "Application order")]
    pub application_order: i64,
    #[serde(rename = "Course")]
    pub course: i64,
    #[serde(rename = "Daytime/evening attendance")]
    pub daytime_evening_attendance: i64,
    #[serde(rename = "Previous qualification")]
    pub previous_qualification: i64,
    #[serde(rename = "Previous qualification (grade)")]
    pub previous_qualification_grade: f64,
    #[serde(rename = "Nacionality")]
    pub nationality: i64,
    #[serde(rename = "Mother's qualification")]
    pub mother_qualification: i64,
    #[serde(rename = "Father's qualification")]
    pub father_qualification: i64,
    #[serde(rename = "Mother's occupation")]
    pub mother_occupation: i64,
    #[serde(rename = "Father's occupation")]
    pub father_occupation: i64,
    #[serde(rename = "Admission grade")]
    pub admission_grade: f64,
    #[serde(rename = "Displaced")]
    pub displaced: i64,
    #[serde(rename = "Educational special needs")]
    pub educational_special_needs: i64,
    #[serde(rename = "Debtor")]
    pub debtor: i64,
    #[serde(rename = "Tuition fees up to date")]
    pub tuition_fees_up_to_date: i64,
    #[serde(rename = "Gender")]
    pub gender: i64,
    #[serde(rename = "Scholarship holder")]
    pub scholarship_holder: i64,
    #[serde(rename = "Age at enrollment")]
    pub age_at_enrollment: i64,
    #[serde(rename = "International")]
    pub international: i64,
    #[serde(rename = "Curricular units 1st sem (credited)")]
    pub sem1_credited: i64,
    #[serde(rename = "Curricular units 1st sem (enrolled)")]
    pub sem1_enrolled: i64,
    #[serde(rename = "Curricular units 1st sem (evaluations)")]
    pub sem1_evaluations: i64,
    #[serde(rename = "Curricular units 1st sem (approved)")]
    pub sem1_approved: i64,
    #[serde(rename = "Curricular units 1st sem (grade)")]
    pub sem1_grade: f64,
    #[serde(rename = "Curricular units 1st sem (without evaluations)")]
    pub sem1_without_evaluations: i64,
    #[serde(rename = "Curricular units 2nd sem (credited)")]
    pub sem2_credited: i64,
    #[serde(rename = "Curricular units 2nd sem (enrolled)")]
    pub sem2_enrolled: i64,
    #[serde(rename = "Curricular units 2nd sem (evaluations)")]
    pub sem2_evaluations: i64,
    #[serde(rename = "Curricular units 2nd sem (approved)")]
    pub sem2_approved: i64,
    #[serde(rename = "Curricular units 2nd sem (grade)")]
    pub sem2_grade: f64,
    #[serde(rename = "Curricular units 2nd sem (without evaluations)")]
    pub sem2_without_evaluations: i64,
    #[serde(rename = "Unemployment rate")]
    pub unemployment_rate: f64,
    #[serde(rename = "Inflation rate")]
    pub inflation_rate: f64,
    #[serde(rename = "GDP")]
    pub gdp: f64,
}

impl StudentRecord {
    /// Read a field by wire name
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        use FieldValue::{Float, Integer};

        let value = match name {
            MARITAL_STATUS => Integer(self.marital_status),
            APPLICATION_MODE => Integer(self.application_mode),
            APPLICATION_ORDER => Integer(self.application_order),
            COURSE => Integer(self.course),
            ATTENDANCE => Integer(self.daytime_evening_attendance),
            PREVIOUS_QUALIFICATION => Integer(self.previous_qualification),
            PREVIOUS_QUALIFICATION_GRADE => Float(self.previous_qualification_grade),
            NATIONALITY => Integer(self.nationality),
            MOTHER_QUALIFICATION => Integer(self.mother_qualification),
            FATHER_QUALIFICATION => Integer(self.father_qualification),
            MOTHER_OCCUPATION => Integer(self.mother_occupation),
            FATHER_OCCUPATION => Integer(self.father_occupation),
            ADMISSION_GRADE => Float(self.admission_grade),
            DISPLACED => Integer(self.displaced),
            SPECIAL_NEEDS => Integer(self.educational_special_needs),
            DEBTOR => Integer(self.debtor),
            TUITION_UP_TO_DATE => Integer(self.tuition_fees_up_to_date),
            GENDER => Integer(self.gender),
            SCHOLARSHIP_HOLDER => Integer(self.scholarship_holder),
            AGE_AT_ENROLLMENT => Integer(self.age_at_enrollment),
            INTERNATIONAL => Integer(self.international),
            SEM1_CREDITED => Integer(self.sem1_credited),
            SEM1_ENROLLED => Integer(self.sem1_enrolled),
            SEM1_EVALUATIONS => Integer(self.sem1_evaluations),
            SEM1_APPROVED => Integer(self.sem1_approved),
            SEM1_GRADE => Float(self.sem1_grade),
            SEM1_WITHOUT_EVALUATIONS => Integer(self.sem1_without_evaluations),
            SEM2_CREDITED => Integer(self.sem2_credited),
            SEM2_ENROLLED => Integer(self.sem2_enrolled),
            SEM2_EVALUATIONS => Integer(self.sem2_evaluations),
            SEM2_APPROVED => Integer(self.sem2_approved),
            SEM2_GRADE => Float(self.sem2_grade),
            SEM2_WITHOUT_EVALUATIONS => Integer(self.sem2_without_evaluations),
            UNEMPLOYMENT_RATE => Float(self.unemployment_rate),
            INFLATION_RATE => Float(self.inflation_rate),
            GDP => Float(self.gdp),
            _ => return None,
        };

        Some(value)
    }

    /// Validate an arbitrary JSON value into a record
    pub fn from_json(value: &Value) -> Result<Self> {
        validate_record(value)
    }
}

/// Validate an arbitrary JSON value against the field table
///
/// Every field is checked before returning; the error lists all missing and
/// malformed fields in table order.
pub fn validate_record(value: &Value) -> Result<StudentRecord> {
    let map = value.as_object().ok_or_else(|| {
        OutcomeError::Validation(vec![FieldViolation::invalid_record(json_type_name(value))])
    })?;

    let mut normalized = Map::with_capacity(FIELDS.len());
    let mut violations = Vec::new();

    for spec in FIELDS.iter() {
        let Some(raw) = map.get(spec.name) else {
            violations.push(FieldViolation::missing(spec.name, spec.kind.as_str()));
            continue;
        };

        match coerce(raw, spec.kind) {
            Some(coerced) => {
                normalized.insert(spec.name.to_string(), coerced);
            }
            None => violations.push(FieldViolation::type_mismatch(
                spec.name,
                spec.kind.as_str(),
                describe(raw),
            )),
        }
    }

    for key in map.keys().filter(|k| field_spec(k).is_none()) {
        tracing::debug!(field = %key, "Ignoring unknown record field");
    }

    if !violations.is_empty() {
        return Err(OutcomeError::Validation(violations));
    }

    serde_json::from_value(Value::Object(normalized))
        .map_err(|e| OutcomeError::pipeline(format!("coerced record did not decode: {}", e)))
}

fn coerce(value: &Value, kind: FieldKind) -> Option<Value> {
    match kind {
        FieldKind::Integer => coerce_integer(value).map(Value::from),
        FieldKind::Float => coerce_float(value).map(Value::from),
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            if n.is_u64() {
                return None;
            }
            let f = n.as_f64()?;
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("number {}", n),
        Value::String(s) if s.chars().count() <= 32 => format!("string \"{}\"", s),
        other => json_type_name(other).to_string(),
    }
}
