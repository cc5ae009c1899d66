// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Vision backends answering questions about images

pub mod gemini;
pub mod ollama;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::config::BackendConfig;
use crate::{Result, ScanError};

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

/// Read an image file as base64 for a JSON payload
pub(crate) fn encode_image(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    Ok(general_purpose::STANDARD.encode(&data))
}

/// Anything that can answer a prompt about an image
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Send one prompt with one image and return the complete reply
    async fn answer(&self, prompt: &str, image_path: &Path) -> Result<String>;
}

/// Which backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Hosted Gemini model
    Remote,
    /// Model served by a local Ollama runtime
    Local,
}

impl FromStr for BackendKind {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "gemini" => Ok(BackendKind::Remote),
            "local" | "ollama" => Ok(BackendKind::Local),
            other => Err(ScanError::Config(format!("Unknown backend kind: {}", other))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Remote => write!(f, "remote"),
            BackendKind::Local => write!(f, "local"),
        }
    }
}

/// A configured vision backend
pub enum VisionBackend {
    Remote(GeminiClient),
    Local(OllamaClient),
}

impl VisionBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            VisionBackend::Remote(_) => BackendKind::Remote,
            VisionBackend::Local(_) => BackendKind::Local,
        }
    }
}

#[async_trait]
impl VisionModel for VisionBackend {
    fn name(&self) -> &str {
        match self {
            VisionBackend::Remote(client) => client.model(),
            VisionBackend::Local(client) => client.model(),
        }
    }

    async fn answer(&self, prompt: &str, image_path: &Path) -> Result<String> {
        match self {
            VisionBackend::Remote(client) => client.generate_with_image(prompt, image_path).await,
            VisionBackend::Local(client) => client.chat_with_image(prompt, image_path).await,
        }
    }
}

/// Build the backend selected by `config.kind`.
///
/// The remote backend reads its API key here, so a missing key fails
/// before any image is processed.
pub fn create_backend(config: &BackendConfig) -> Result<VisionBackend> {
    let kind: BackendKind = config.kind.parse()?;

    let backend = match kind {
        BackendKind::Remote => VisionBackend::Remote(GeminiClient::from_config(&config.remote)?),
        BackendKind::Local => VisionBackend::Local(OllamaClient::new(
            &config.local.url,
            &config.local.model,
            Duration::from_secs(config.local.timeout_secs),
        )?),
    };

    info!("Using {} vision backend: {}", backend.kind(), backend.name());
    Ok(backend)
}
