//! Generative text client
//!
//! `GeminiClient` calls the `generateContent` REST endpoint. Requests are a
//! prompt, optionally with a system instruction, one inline attachment and
//! a JSON response schema.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AiError {
    #[error("AI API key is not configured")]
    MissingApiKey,
    #[error("network error: {0}")]
    Transport(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("empty response from AI")]
    Empty,
    #[error("malformed AI output: {0}")]
    Malformed(String),
}

/// Binary input sent alongside the prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// One generation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub attachment: Option<Attachment>,
    /// Constrain the output to JSON matching this schema
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_attachment(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.attachment = Some(Attachment {
            mime_type: mime_type.into(),
            data,
        });
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Source of generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GeminiRequest {
    fn from_request(request: GenerateRequest) -> Self {
        let mut parts = Vec::new();
        if let Some(attachment) = request.attachment {
            parts.push(Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: attachment.mime_type,
                    data: STANDARD.encode(attachment.data),
                }),
            });
        }
        parts.push(Part {
            text: Some(request.prompt),
            inline_data: None,
        });

        Self {
            contents: vec![Content {
                role: Some("user"),
                parts,
            }],
            system_instruction: request.system_instruction.map(|text| Content {
                role: None,
                parts: vec![Part {
                    text: Some(text),
                    inline_data: None,
                }],
            }),
            generation_config: request.response_schema.map(|schema| GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini REST client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Generation can be much slower than store calls
    const MIN_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self, AiError> {
        let api_key = config.ai_api_key.clone().ok_or(AiError::MissingApiKey)?;
        Self::new(
            api_key,
            config.ai_model.clone(),
            config.request_timeout().max(Self::MIN_TIMEOUT),
        )
    }

    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, AiError> {
        if api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey);
        }
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model,
            base_url: GEMINI_API_URL.to_string(),
            timeout,
        })
    }

    /// Point the client at another endpoint (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, AiError> {
        let body = GeminiRequest::from_request(request);
        debug!("Calling {} ({} parts)", self.model, body.contents[0].parts.len());

        let res = self
            .http
            .post(self.endpoint())
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout(self.timeout)
                } else {
                    AiError::Transport(e.to_string())
                }
            })?;

        match res.status() {
            s if s.is_success() => {
                let response: GeminiResponse = res
                    .json()
                    .await
                    .map_err(|e| AiError::Malformed(e.to_string()))?;
                response.text().ok_or(AiError::Empty)
            }
            s => {
                let body = res.text().await.unwrap_or_default();
                let message = serde_json::from_str::<Value>(&body)
                    .ok()
                    .and_then(|v| {
                        v.pointer("/error/message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .unwrap_or(body);
                Err(AiError::Http {
                    status: s.as_u16(),
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key() {
        let config = Config::default();
        assert_eq!(
            GeminiClient::from_config(&config).unwrap_err(),
            AiError::MissingApiKey
        );
        assert!(GeminiClient::new("  ".into(), "m".into(), Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_endpoint_includes_model() {
        let client = GeminiClient::new("k".into(), "gemini-2.5-flash".into(), Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerateRequest::new("Summarise this")
            .with_system("Be brief")
            .with_attachment("application/pdf", b"%PDF".to_vec())
            .with_schema(serde_json::json!({"type": "OBJECT"}));
        let body = serde_json::to_value(GeminiRequest::from_request(request)).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(parts[0]["inlineData"]["data"], "JVBERg==");
        assert_eq!(parts[1]["text"], "Summarise this");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_plain_request_omits_optional_sections() {
        let body = serde_json::to_value(GeminiRequest::from_request(GenerateRequest::new("hi"))).unwrap();
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("generationConfig").is_none());
        assert!(body["contents"][0]["parts"][0].get("inlineData").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "there"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello there"));

        let empty: GeminiResponse = serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert_eq!(empty.text(), None);
    }
}
