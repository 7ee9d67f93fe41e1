//! ONNX Runtime adapter for the classifier port. The artifact is a tree
//! ensemble exported from the offline training pipeline with zipmap disabled:
//! one float input `[N, 18]`, an int64 label output and a float probability
//! output `[N, 2]` ordered (human, bot).
//!
//! If the model file is missing or fails to load, the adapter starts in
//! degraded mode: every call reports [`ClassifierError::Unavailable`] instead
//! of crashing the service.

use super::{Classification, Classifier, ClassifierError, CLASS_BOT, CLASS_HUMAN};
use crate::features::{FeatureVector, FEATURE_DIM};
use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

struct LoadedModel {
    session: Session,
    output_names: Vec<String>,
}

pub struct OnnxClassifier {
    // ort's run() takes &mut; the mutex keeps the port callable through &self.
    inner: Option<Mutex<LoadedModel>>,
}

impl OnnxClassifier {
    /// Load the model artifact. Missing or invalid artifacts leave the
    /// classifier in degraded mode rather than failing startup.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "model artifact not found; running degraded");
            return Self { inner: None };
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(path));

        match session {
            Ok(session) => {
                let output_names: Vec<String> =
                    session.outputs.iter().map(|o| o.name.clone()).collect();
                info!(path = %path.display(), outputs = output_names.len(), "model loaded");
                Self {
                    inner: Some(Mutex::new(LoadedModel {
                        session,
                        output_names,
                    })),
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "model load failed; running degraded");
                Self { inner: None }
            }
        }
    }

    /// Degraded-mode constructor, mainly for tests.
    pub fn unavailable() -> Self {
        Self { inner: None }
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, features: &FeatureVector) -> Result<Classification, ClassifierError> {
        let inner = self.inner.as_ref().ok_or(ClassifierError::Unavailable)?;
        let mut model = inner.lock().map_err(|_| {
            ClassifierError::Inference("classifier mutex poisoned".to_string())
        })?;

        let input: Vec<f32> = features.as_slice().iter().map(|&v| v as f32).collect();
        let array = Array2::<f32>::from_shape_vec((1, FEATURE_DIM), input)
            .map_err(|e| ClassifierError::Inference(format!("input shape: {e}")))?;
        let tensor = Value::from_array(array)
            .map_err(|e| ClassifierError::Inference(format!("input tensor: {e}")))?;

        let output_names = model.output_names.clone();
        let outputs = model
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| ClassifierError::Inference(format!("session run: {e}")))?;

        // Tree-ensemble exports carry a label tensor and a probability tensor;
        // output order is not guaranteed, so probe by element type.
        let mut label: Option<i64> = None;
        let mut probabilities: Option<[f64; 2]> = None;
        for name in &output_names {
            let Some(value) = outputs.get(name) else {
                continue;
            };
            if let Ok((_, data)) = value.try_extract_tensor::<i64>() {
                if label.is_none() {
                    label = data.first().copied();
                }
            } else if let Ok((_, data)) = value.try_extract_tensor::<f32>() {
                if probabilities.is_none() && data.len() >= 2 {
                    probabilities = Some([f64::from(data[0]), f64::from(data[1])]);
                }
            }
        }

        let mut probabilities = probabilities
            .ok_or_else(|| ClassifierError::Inference("no probability output".to_string()))?;
        let sum = probabilities[CLASS_HUMAN] + probabilities[CLASS_BOT];
        if sum > 0.0 {
            probabilities[CLASS_HUMAN] /= sum;
            probabilities[CLASS_BOT] /= sum;
        }
        let is_bot = match label {
            Some(l) => l != 0,
            None => probabilities[CLASS_BOT] > probabilities[CLASS_HUMAN],
        };

        Ok(Classification {
            is_bot,
            probabilities,
        })
    }

    fn is_loaded(&self) -> bool {
        self.inner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_runs_degraded() {
        let c = OnnxClassifier::load(Path::new("nonexistent.onnx"));
        assert!(!c.is_loaded());
        let fv = FeatureVector::new([0.0; FEATURE_DIM]);
        assert!(matches!(
            c.classify(&fv),
            Err(ClassifierError::Unavailable)
        ));
    }
}
