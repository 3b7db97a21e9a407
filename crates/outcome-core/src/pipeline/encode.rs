//! Categorical indicator expansion against a frozen vocabulary

use std::collections::BTreeMap;

use crate::error::{OutcomeError, Result};
use crate::schema::{categorical_fields, field_spec, FieldSpec, FieldValue, FIELDS};

use super::engineer::EngineeredRecord;

/// Indicator column name for a categorical value, e.g. `Course_9254`
pub fn indicator_column(field: &str, value: i64) -> String {
    format!("{}_{}", field, value)
}

/// Category values seen at training time, per categorical field
///
/// Values are kept sorted; the lowest value of each field is the reference
/// category and gets no indicator column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVocabulary {
    fields: BTreeMap<String, Vec<i64>>,
}

impl CategoryVocabulary {
    /// Build a vocabulary, requiring exactly the categorical fields
    pub fn new(fields: BTreeMap<String, Vec<i64>>) -> Result<Self> {
        let mut normalized = BTreeMap::new();

        for (name, mut values) in fields {
            match field_spec(&name) {
                Some(FieldSpec { categorical: true, .. }) => {}
                _ => {
                    return Err(OutcomeError::pipeline(format!(
                        "vocabulary names '{}', which is not a categorical field",
                        name
                    )))
                }
            }
            values.sort_unstable();
            values.dedup();
            if values.is_empty() {
                return Err(OutcomeError::pipeline(format!(
                    "vocabulary for '{}' is empty",
                    name
                )));
            }
            normalized.insert(name, values);
        }

        let missing: Vec<_> = categorical_fields()
            .filter(|name| !normalized.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(OutcomeError::pipeline(format!(
                "vocabulary is missing categorical fields: {}",
                missing.join(", ")
            )));
        }

        Ok(Self { fields: normalized })
    }

    /// All known values of a field, reference first
    pub fn values(&self, field: &str) -> Option<&[i64]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// The dropped reference value of a field
    pub fn reference(&self, field: &str) -> Option<i64> {
        self.values(field).and_then(|v| v.first().copied())
    }

    /// Every indicator column this vocabulary can emit, in field order
    pub fn indicator_columns(&self) -> Vec<String> {
        categorical_fields()
            .flat_map(|field| {
                self.values(field)
                    .unwrap_or_default()
                    .iter()
                    .skip(1)
                    .map(move |v| indicator_column(field, *v))
            })
            .collect()
    }
}

/// Named numeric columns after indicator expansion
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    columns: Vec<(String, f64)>,
}

impl EncodedRecord {
    #[cfg(test)]
    pub(crate) fn from_columns(columns: Vec<(String, f64)>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[(String, f64)] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Replace every categorical field with its indicator columns
///
/// Non-categorical fields keep their wire name, derived features follow, then
/// indicators for each categorical field. A value missing from the vocabulary
/// produces all-zero indicators for that field.
pub fn encode(engineered: &EngineeredRecord, vocabulary: &CategoryVocabulary) -> EncodedRecord {
    let mut columns = Vec::with_capacity(FIELDS.len() + 4);

    for spec in FIELDS.iter().filter(|f| !f.categorical) {
        if let Some(value) = engineered.record.get(spec.name) {
            columns.push((spec.name.to_string(), value.as_f64()));
        }
    }

    for (name, value) in engineered.derived.columns() {
        columns.push((name.to_string(), value));
    }

    for field in categorical_fields() {
        let Some(FieldValue::Integer(observed)) = engineered.record.get(field) else {
            continue;
        };
        let known = vocabulary.values(field).unwrap_or_default();

        if known.binary_search(&observed).is_err() {
            tracing::debug!(field, value = observed, "Category value unseen at training time");
        }

        for value in known.iter().skip(1) {
            let hot = if *value == observed { 1.0 } else { 0.0 };
            columns.push((indicator_column(field, *value), hot));
        }
    }

    EncodedRecord { columns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, StudentRecord, COURSE, GENDER};
    use serde_json::{json, Map, Value};

    fn vocabulary() -> CategoryVocabulary {
        let fields = categorical_fields()
            .map(|f| (f.to_string(), vec![1, 0]))
            .chain([(COURSE.to_string(), vec![33, 171, 9254, 171])])
            .collect();
        CategoryVocabulary::new(fields).unwrap()
    }

    fn engineered(course: i64) -> EngineeredRecord {
        let mut map = Map::new();
        for spec in FIELDS.iter() {
            let v = match spec.kind {
                FieldKind::Integer => json!(1),
                FieldKind::Float => json!(12.5),
            };
            map.insert(spec.name.to_string(), v);
        }
        map.insert(COURSE.to_string(), json!(course));
        EngineeredRecord::new(StudentRecord::from_json(&Value::Object(map)).unwrap())
    }

    #[test]
    fn test_vocabulary_sorted_and_deduplicated() {
        let vocab = vocabulary();
        assert_eq!(vocab.values(COURSE), Some(&[33, 171, 9254][..]));
        assert_eq!(vocab.reference(COURSE), Some(33));
        assert_eq!(vocab.reference(GENDER), Some(0));
    }

    #[test]
    fn test_vocabulary_requires_all_fields() {
        let fields = [(COURSE.to_string(), vec![1, 2])].into_iter().collect();
        let err = CategoryVocabulary::new(fields).unwrap_err();
        assert!(err.to_string().contains("Marital status"));
    }

    #[test]
    fn test_vocabulary_rejects_non_categorical() {
        let fields = categorical_fields()
            .map(|f| (f.to_string(), vec![0, 1]))
            .chain([("GDP".to_string(), vec![1])])
            .collect();
        assert!(CategoryVocabulary::new(fields).is_err());
    }

    #[test]
    fn test_reference_category_dropped() {
        let encoded = encode(&engineered(33), &vocabulary());
        assert_eq!(encoded.get("Course_33"), None);
        assert_eq!(encoded.get("Course_171"), Some(0.0));
        assert_eq!(encoded.get("Course_9254"), Some(0.0));
    }

    #[test]
    fn test_observed_category_is_hot() {
        let encoded = encode(&engineered(9254), &vocabulary());
        assert_eq!(encoded.get("Course_171"), Some(0.0));
        assert_eq!(encoded.get("Course_9254"), Some(1.0));
        assert_eq!(encoded.get("Course"), None);
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let encoded = encode(&engineered(4242), &vocabulary());
        assert_eq!(encoded.get("Course_171"), Some(0.0));
        assert_eq!(encoded.get("Course_9254"), Some(0.0));
        assert_eq!(encoded.get("Course_4242"), None);
    }

    #[test]
    fn test_column_count_independent_of_values() {
        let vocab = vocabulary();
        let a = encode(&engineered(33), &vocab);
        let b = encode(&engineered(4242), &vocab);
        assert_eq!(a.len(), b.len());
        assert_eq!(a.len(), 19 + 4 + vocab.indicator_columns().len());
    }
}
