//! Frozen categorical encoding tables

use crate::models::EfficiencyLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Integer codes for the operation mode, fit once over the corpus.
///
/// Codes follow the sorted order of the distinct values. The table is
/// persisted with the scaler and never re-derived at inference time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingTables {
    operation_modes: Vec<String>,
}

impl EncodingTables {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let distinct: BTreeSet<&str> = values.into_iter().collect();
        Self {
            operation_modes: distinct.into_iter().map(str::to_string).collect(),
        }
    }

    /// Code for a known operation mode
    pub fn encode_operation_mode(&self, value: &str) -> Option<usize> {
        self.operation_modes.iter().position(|m| m == value)
    }

    /// True if `code` was assigned by this table
    pub fn is_valid_code(&self, code: usize) -> bool {
        code < self.operation_modes.len()
    }

    pub fn operation_modes(&self) -> &[String] {
        &self.operation_modes
    }

    /// Ordinal code of a target label
    pub fn encode_target(&self, value: &str) -> Option<usize> {
        EfficiencyLabel::parse(value).map(EfficiencyLabel::code)
    }
}
