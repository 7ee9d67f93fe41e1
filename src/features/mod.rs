//! Kinematic feature extraction from ordered coordinate sequences.

mod kinematics;

pub use kinematics::{extract_features, ExtractionError};

use serde::{Deserialize, Serialize};

/// Number of features the model expects.
pub const FEATURE_DIM: usize = 18;

/// Fixed-size feature vector for model input. Always exactly [`FEATURE_DIM`]
/// finite values; extraction is all-or-nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_DIM],
}

impl FeatureVector {
    /// Wrap raw values, replacing NaN/infinite entries with 0.0.
    pub fn new(mut values: [f64; FEATURE_DIM]) -> Self {
        for v in values.iter_mut() {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }
}
