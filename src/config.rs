//! Service configuration. JSON file overrides defaults; absent or invalid file
//! falls back to defaults so the binary always starts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to
    pub bind_addr: String,
    /// Data directory (session database)
    pub data_dir: PathBuf,
    /// Path to the ONNX bot-detection model
    pub model_path: PathBuf,
    /// Detection pipeline parameters
    pub detection: DetectionConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum usable coordinate samples before extraction is attempted
    pub min_coordinates: usize,
    /// Seconds without a prediction before a session reads as inactive
    pub inactivity_secs: i64,
    /// How many sessions the admin listing returns by default
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            data_dir: PathBuf::from(".touchguard"),
            model_path: PathBuf::from("models/bot_detector.onnx"),
            detection: DetectionConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_coordinates: 3,
            inactivity_secs: 120,
            recent_limit: 50,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ServerConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<ServerConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_yields_defaults() {
        let c = ServerConfig::load(std::path::Path::new("nonexistent.json"));
        assert_eq!(c.detection.min_coordinates, 3);
        assert_eq!(c.detection.inactivity_secs, 120);
        assert_eq!(c.bind_addr, "0.0.0.0:8000");
    }

    #[test]
    fn load_invalid_json_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{\"bind_addr\": 42}").unwrap();
        let c = ServerConfig::load(&path);
        assert_eq!(c.bind_addr, "0.0.0.0:8000");
    }
}
