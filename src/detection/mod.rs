//! Detection orchestrator: raw movements → coordinates → features →
//! classification → verdict, with best-effort persistence.

use crate::features::{self, FeatureVector};
use crate::model::{Classifier, ClassifierError, CLASS_BOT, CLASS_HUMAN};
use crate::store::{SessionStore, StoreError};
use crate::telemetry::{self, MovementSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors a detection call can surface. These are deterministic functions of
/// the input (or of startup state), so no retries happen anywhere.
#[derive(Debug, Error, PartialEq)]
pub enum DetectionError {
    #[error("Insufficient movement data")]
    InsufficientData,
    #[error("Feature extraction failed")]
    ExtractionFailed,
    #[error("Model not loaded")]
    ModelUnavailable,
}

/// Result of one detection call. Immutable once produced; a copy goes to the
/// caller and the classification fields go to the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub session_id: String,
    pub is_bot: bool,
    /// Max class probability scaled to 0-100, rounded to 2 decimals.
    pub confidence: f64,
    pub classification: String,
    pub timestamp: DateTime<Utc>,
    pub movement_count: u32,
    pub features: Vec<f64>,
}

pub struct DetectionEngine {
    classifier: Arc<dyn Classifier>,
    store: Arc<SessionStore>,
    min_coordinates: usize,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl DetectionEngine {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        store: Arc<SessionStore>,
        min_coordinates: usize,
    ) -> Self {
        Self {
            classifier,
            store,
            min_coordinates,
        }
    }

    /// Run the full pipeline for one request. Persistence failures are logged
    /// and swallowed: the verdict still goes back to the caller, and the next
    /// verdict for the same session will repair the row.
    pub fn detect(
        &self,
        session_id: &str,
        movements: &[MovementSample],
        click_count: u32,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<Verdict, DetectionError> {
        let coords = telemetry::parse_coordinates(movements);
        if coords.len() < self.min_coordinates {
            return Err(DetectionError::InsufficientData);
        }

        let feature_vector = features::extract_features(&coords, click_count)
            .map_err(|_| DetectionError::ExtractionFailed)?;

        let verdict = self.classify_into_verdict(session_id, &feature_vector, movements.len())?;

        if let Err(e) = self.persist(&verdict, client_ip, user_agent) {
            warn!(session_id, error = %e, "verdict persistence failed");
        }

        info!(
            session_id,
            classification = %verdict.classification,
            confidence = verdict.confidence,
            movements = verdict.movement_count,
            "detection result"
        );
        Ok(verdict)
    }

    fn classify_into_verdict(
        &self,
        session_id: &str,
        feature_vector: &FeatureVector,
        movement_count: usize,
    ) -> Result<Verdict, DetectionError> {
        let outcome = self.classifier.classify(feature_vector).map_err(|e| match e {
            ClassifierError::Unavailable => DetectionError::ModelUnavailable,
            ClassifierError::Inference(msg) => {
                warn!(session_id, error = %msg, "inference error");
                DetectionError::ModelUnavailable
            }
        })?;

        let confidence = round2(
            outcome.probabilities[CLASS_HUMAN].max(outcome.probabilities[CLASS_BOT]) * 100.0,
        );
        Ok(Verdict {
            session_id: session_id.to_string(),
            is_bot: outcome.is_bot,
            confidence,
            classification: if outcome.is_bot { "Bot" } else { "Human" }.to_string(),
            timestamp: Utc::now(),
            movement_count: movement_count as u32,
            features: feature_vector.to_vec(),
        })
    }

    fn persist(&self, verdict: &Verdict, client_ip: &str, user_agent: &str) -> Result<(), StoreError> {
        self.store.upsert(
            &verdict.session_id,
            &verdict.classification,
            verdict.confidence,
            verdict.movement_count,
            verdict.timestamp,
            client_ip,
            user_agent,
        )
    }
}
