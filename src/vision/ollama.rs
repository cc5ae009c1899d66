// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ollama API client for local vision inference

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::encode_image;
use crate::{Result, ScanError};

/// Ollama API client bound to one vision model
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

/// Strip trailing slashes and endpoint paths from a configured URL
fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/')
        .replace("/api/generate", "")
        .replace("/api/chat", "")
}

/// Match a model name against installed tags, accepting an implicit `:latest`
fn model_installed(installed: &[String], model: &str) -> bool {
    installed
        .iter()
        .any(|m| m.starts_with(model) || m == &format!("{}:latest", model))
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                ScanError::Backend(format!(
                    "Cannot connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        Ok(())
    }

    /// List installed models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check if the configured model is installed
    pub async fn model_available(&self) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(model_installed(&models, &self.model))
    }

    /// Ask the model about one image
    pub async fn chat_with_image(&self, prompt: &str, image_path: &Path) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
                images: vec![encode_image(image_path)?],
            }],
            stream: false,
        };

        debug!("Sending vision request to Ollama: model={}", self.model);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ScanError::Backend(format!(
                    "Cannot reach Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::Backend(format!(
                "Ollama returned status {}: {}",
                status,
                body.trim()
            )));
        }

        let result: ChatResponse = response.json().await?;
        Ok(result.message.content)
    }
}
