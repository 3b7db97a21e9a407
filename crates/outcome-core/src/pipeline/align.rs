//! Column alignment against the frozen training-time column list

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{OutcomeError, Result};

use super::encode::EncodedRecord;

/// Ordered training-time column names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenColumns {
    names: Arc<[String]>,
    index: Arc<HashMap<String, usize>>,
}

impl FrozenColumns {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(OutcomeError::pipeline("frozen column list is empty"));
        }

        let mut index = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(OutcomeError::pipeline("frozen column list has an empty name"));
            }
            if index.insert(name.clone(), position).is_some() {
                return Err(OutcomeError::pipeline(format!(
                    "frozen column '{}' appears more than once",
                    name
                )));
            }
        }

        Ok(Self {
            names: names.into(),
            index: Arc::new(index),
        })
    }

    pub(crate) fn shared_names(&self) -> Arc<[String]> {
        Arc::clone(&self.names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

/// Feature values in frozen column order
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedVector {
    columns: Arc<[String]>,
    values: Vec<f64>,
}

impl AlignedVector {
    pub(crate) fn from_parts(columns: Arc<[String]>, values: Vec<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

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

    pub(crate) fn into_parts(self) -> (Arc<[String]>, Vec<f64>) {
        (self.columns, self.values)
    }
}

/// Reindex an encoded record onto the frozen columns
///
/// Columns the frozen list does not name are dropped; frozen columns the
/// record lacks are filled with zero.
pub fn align(encoded: &EncodedRecord, frozen: &FrozenColumns) -> AlignedVector {
    let lookup: HashMap<&str, f64> = encoded
        .columns()
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();

    let values: Vec<f64> = frozen
        .names()
        .iter()
        .map(|name| lookup.get(name.as_str()).copied().unwrap_or(0.0))
        .collect();

    let dropped = encoded
        .columns()
        .iter()
        .filter(|(name, _)| !frozen.contains(name))
        .count();
    if dropped > 0 {
        tracing::trace!(dropped, "Discarded columns absent from the frozen list");
    }

    AlignedVector::from_parts(Arc::clone(&frozen.names), values)
}
