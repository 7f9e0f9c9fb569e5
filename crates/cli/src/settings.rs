use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use chronolens_core::detection::infrastructure::model_resolver::APP_DIR_NAME;
use chronolens_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use chronolens_core::shared::constants::{
    DEFAULT_GENERATION_ENDPOINT, DEFAULT_GENERATION_MODEL, GENERATION_TIMEOUT_SECS,
};

/// Persistent preferences. The API key is never stored here; it only comes
/// from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub confidence: f64,
    pub camera_device: Option<String>,
    pub export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GENERATION_ENDPOINT.to_string(),
            model: DEFAULT_GENERATION_MODEL.to_string(),
            request_timeout_secs: GENERATION_TIMEOUT_SECS,
            confidence: DEFAULT_CONFIDENCE,
            camera_device: None,
            export_dir: None,
        }
    }
}

/// Values read from environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `GEMINI_API_KEY` wins over `API_KEY`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            model: get("CHRONOLENS_MODEL"),
            endpoint: get("CHRONOLENS_ENDPOINT"),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            self.save_to(&path);
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = fs::write(path, json);
        }
    }

    /// Environment values replace file values.
    pub fn with_env(mut self, env: &Environment) -> Self {
        if let Some(model) = &env.model {
            self.model = model.clone();
        }
        if let Some(endpoint) = &env.endpoint {
            self.endpoint = endpoint.clone();
        }
        self
    }
}
