//! Feature pipeline
//!
//! Turns one validated [`StudentRecord`] into the exact vector the classifier
//! was trained on. The stages run in a fixed order:
//!
//! 1. `engineer` - four derived features
//! 2. `encode` - categorical fields become indicator columns
//! 3. `align` - reindex onto the frozen column list
//! 4. `scale` - standardize the scaler's fitted columns
//!
//! All frozen inputs (vocabulary, column list, scaler parameters) are fixed
//! at construction and shared read-only afterwards.

pub mod align;
pub mod encode;
pub mod engineer;
pub mod scale;

pub use align::{align, AlignedVector, FrozenColumns};
pub use encode::{encode, indicator_column, CategoryVocabulary, EncodedRecord};
pub use engineer::{DerivedFeatures, EngineeredRecord, DERIVED_COLUMNS};
pub use scale::{ScaledVector, ScalerPlan, StandardScaler};

use std::collections::HashSet;

use crate::error::Result;
use crate::schema::{StudentRecord, FIELDS};

/// The frozen preprocessing pipeline
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    vocabulary: CategoryVocabulary,
    columns: FrozenColumns,
    scaler: ScalerPlan,
}

impl FeaturePipeline {
    pub fn new(
        vocabulary: CategoryVocabulary,
        columns: FrozenColumns,
        scaler: &StandardScaler,
    ) -> Result<Self> {
        let scaler = ScalerPlan::new(scaler, &columns)?;
        Ok(Self {
            vocabulary,
            columns,
            scaler,
        })
    }

    pub fn columns(&self) -> &FrozenColumns {
        &self.columns
    }

    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }

    pub fn scaler(&self) -> &ScalerPlan {
        &self.scaler
    }

    /// Width of the produced vector
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Frozen columns that no record can ever populate
    ///
    /// These are always zero after alignment. A non-empty result usually means
    /// the column list and the vocabulary come from different training runs.
    pub fn unproducible_columns(&self) -> Vec<&str> {
        let producible: HashSet<String> = FIELDS
            .iter()
            .filter(|f| !f.categorical)
            .map(|f| f.name.to_string())
            .chain(DERIVED_COLUMNS.iter().map(|c| c.to_string()))
            .chain(self.vocabulary.indicator_columns())
            .collect();

        self.columns
            .names()
            .iter()
            .filter(|name| !producible.contains(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Run stages 1-3
    pub fn align(&self, record: &StudentRecord) -> AlignedVector {
        let engineered = EngineeredRecord::new(record.clone());
        let encoded = encode(&engineered, &self.vocabulary);
        align(&encoded, &self.columns)
    }

    /// Run the full pipeline
    pub fn transform(&self, record: &StudentRecord) -> Result<ScaledVector> {
        self.scaler.apply(self.align(record))
    }
}
