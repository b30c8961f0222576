//! Standard scaling fit on the training split

use crate::error::{Error, ErrorKind, Result};
use crate::models::{FeatureVector, NUM_FEATURES};
use serde::{Deserialize, Serialize};

/// Per-feature mean and population standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: [f64; NUM_FEATURES],
    pub std: [f64; NUM_FEATURES],
}

impl ScalerParams {
    /// Fit on the given rows. A constant feature gets a std of 1.0.
    pub fn fit(rows: &[FeatureVector]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::new(
                ErrorKind::Preprocessing,
                "Cannot fit scaler on an empty training split",
            ));
        }
        let n = rows.len() as f64;

        let mut mean = [0.0; NUM_FEATURES];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row.values()) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut std = [0.0; NUM_FEATURES];
        for row in rows {
            for ((s, v), m) in std.iter_mut().zip(row.values()).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        for s in std.iter_mut() {
            *s = (*s / n).sqrt();
            if *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }

        Ok(Self { mean, std })
    }

    /// `(x - mean) / std` per feature
    pub fn transform(&self, row: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; NUM_FEATURES];
        for (i, v) in row.values().iter().enumerate() {
            out[i] = (v - self.mean[i]) / self.std[i];
        }
        FeatureVector::new(out)
    }

    pub fn transform_all(&self, rows: &[FeatureVector]) -> Vec<FeatureVector> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
