// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Thermoscan

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Vision backend selection and settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Input/output directories and pacing
    #[serde(default)]
    pub batch: BatchConfig,

    /// Question sent with every image
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    /// `gemini`/`remote` or `ollama`/`local`
    #[serde(default = "default_backend_kind")]
    pub kind: String,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub local: LocalConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_model")]
    pub model: String,
    #[serde(default = "default_remote_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocalConfig {
    #[serde(default = "default_local_model")]
    pub model: String,
    #[serde(default = "default_local_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BatchConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Image extensions to process, compared case-insensitively
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Fixed pause after every backend call
    #[serde(default = "default_request_delay")]
    pub request_delay_secs: u64,
}

// Default value functions
fn default_backend_kind() -> String { "gemini".to_string() }
fn default_remote_model() -> String { "gemini-2.0-flash-exp".to_string() }
fn default_remote_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}
fn default_api_key_env() -> String { "GOOGLE_API_KEY".to_string() }
fn default_local_model() -> String { "llama3.2-vision".to_string() }
fn default_local_url() -> String { "http://localhost:11434".to_string() }
fn default_timeout() -> u64 { 120 }
fn default_input_dir() -> PathBuf { PathBuf::from("placas/test/") }
fn default_output_dir() -> PathBuf { PathBuf::from("txt_outputs") }
fn default_request_delay() -> u64 { 2 }

fn default_extensions() -> Vec<String> {
    vec!["jpeg", "jpg", "png"].into_iter().map(String::from).collect()
}

fn default_prompt() -> String {
    "Here is a thermal image from solar panels. \
     They are purple rectangles. If there are orange spots inside the purple, \
     that means the panel is damaged. If the panel is completely purple, it's fine. \
     Only tell me True if damaged and False if not."
        .to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            batch: BatchConfig::default(),
            prompt: default_prompt(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
            remote: RemoteConfig::default(),
            local: LocalConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            model: default_remote_model(),
            endpoint: default_remote_endpoint(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            model: default_local_model(),
            url: default_local_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            extensions: default_extensions(),
            request_delay_secs: default_request_delay(),
        }
    }
}

impl BatchConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    /// Check whether a path carries one of the configured image extensions
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::ScanError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
