//! TouchGuard — behavioral bot detection from mouse telemetry.
//!
//! Modular structure:
//! - [`telemetry`] — Raw movement record validation and coordinate parsing
//! - [`features`] — 18-dimensional kinematic feature extraction
//! - [`model`] — Classifier port and ONNX adapter
//! - [`detection`] — Orchestrator: parse → extract → classify → persist
//! - [`store`] — SQLite session store with derived status
//! - [`api`] — REST boundary (detection + operator endpoints)
//! - [`logging`] — Structured logging setup

pub mod api;
pub mod config;
pub mod detection;
pub mod features;
pub mod logging;
pub mod model;
pub mod store;
pub mod telemetry;

pub use config::ServerConfig;
pub use detection::{DetectionEngine, DetectionError, Verdict};
pub use features::{FeatureVector, FEATURE_DIM};
pub use model::{Classification, Classifier, ClassifierError, OnnxClassifier};
pub use store::{SessionRecord, SessionStatus, SessionStore};
pub use telemetry::MovementSample;
