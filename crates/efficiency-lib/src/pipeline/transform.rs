//! The persisted feature transform: encoding tables plus scaler

use super::encoding::EncodingTables;
use super::scaler::ScalerParams;
use crate::models::FeatureVector;
use serde::{Deserialize, Serialize};

/// Everything needed to reproduce the training-time transform on a new row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransform {
    pub encoding: EncodingTables,
    pub scaler: ScalerParams,
}

impl FeatureTransform {
    pub fn new(encoding: EncodingTables, scaler: ScalerParams) -> Self {
        Self { encoding, scaler }
    }

    pub fn scale(&self, row: &FeatureVector) -> FeatureVector {
        self.scaler.transform(row)
    }
}
