//! Classifier capability: feature vector in, label + class probabilities out.
//! The concrete model is an external artifact loaded at startup; everything
//! downstream depends only on the [`Classifier`] trait so tests can substitute
//! a deterministic stub.

mod onnx;

pub use onnx::OnnxClassifier;

use crate::features::FeatureVector;
use thiserror::Error;

/// Index of the human class in [`Classification::probabilities`].
pub const CLASS_HUMAN: usize = 0;
/// Index of the bot class in [`Classification::probabilities`].
pub const CLASS_BOT: usize = 1;

/// One classification outcome. `probabilities[CLASS_HUMAN]` and
/// `probabilities[CLASS_BOT]` sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub is_bot: bool,
    pub probabilities: [f64; 2],
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    /// No model artifact was available at startup; the service runs degraded
    /// and every call reports this deterministically.
    #[error("model not loaded")]
    Unavailable,
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Binary human/bot classifier. Implementations must be safe to call
/// concurrently and must not mutate observable state per call.
pub trait Classifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> Result<Classification, ClassifierError>;

    /// Whether a model is actually loaded (health reporting).
    fn is_loaded(&self) -> bool;
}
