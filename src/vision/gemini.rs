// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Gemini API client for hosted vision inference

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::encode_image;
use crate::config::RemoteConfig;
use crate::{Result, ScanError};

/// Gemini `generateContent` client bound to one model
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// MIME type sent alongside the image bytes
fn mime_type_for(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("image/jpeg")
}

/// Join the text parts of the first candidate into one reply
fn reply_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        ScanError::Backend(format!(
            "Gemini returned no candidates (feedback: {})",
            response
                .prompt_feedback
                .map(|f| f.to_string())
                .unwrap_or_else(|| "none".to_string())
        ))
    })?;

    let text: String = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        return Err(ScanError::Backend("Gemini reply contained no text".to_string()));
    }
    Ok(text)
}

impl GeminiClient {
    /// Create a client reading the API key from the configured environment variable
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ScanError::Config(format!(
                    "Missing API key: set {} in the environment or .env",
                    config.api_key_env
                ))
            })?;

        Self::with_api_key(
            &config.endpoint,
            &config.model,
            &api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(endpoint: &str, model: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint, self.model)
    }

    /// Ask the model about one image and wait for the complete reply
    pub async fn generate_with_image(&self, prompt: &str, image_path: &Path) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(prompt.to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: mime_type_for(image_path).to_string(),
                            data: encode_image(image_path)?,
                        }),
                    },
                ],
                role: Some("user".to_string()),
            }],
        };

        debug!("Sending vision request to Gemini: model={}", self.model);

        let response = self.client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::Backend(format!(
                "Gemini returned status {}: {}",
                status,
                body.trim()
            )));
        }

        let result: GenerateContentResponse = response.json().await?;
        reply_text(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_url() {
        let client = GeminiClient::with_api_key(
            "https://generativelanguage.googleapis.com/v1beta/models/",
            "gemini-2.0-flash-exp",
            "key",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = RemoteConfig {
            api_key_env: "THERMOSCAN_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..RemoteConfig::default()
        };
        assert!(matches!(GeminiClient::from_config(&config), Err(ScanError::Config(_))));
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Tr" }, { "text": "ue" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 270 }
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(reply_text(parsed).unwrap(), "True");
    }

    #[test]
    fn test_blocked_reply_is_backend_error() {
        let body = r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        match reply_text(parsed) {
            Err(ScanError::Backend(msg)) => assert!(msg.contains("SAFETY")),
            _ => panic!("Expected backend error"),
        }
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: "image/png".to_string(),
                        data: "AAAA".to_string(),
                    }),
                }],
                role: None,
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert!(json["contents"][0].get("role").is_none());
    }

    #[test]
    fn test_mime_type_from_extension() {
        assert_eq!(mime_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("a.unknown")), "image/jpeg");
    }
}
