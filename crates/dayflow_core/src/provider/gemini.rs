//! Hosted Gemini text generator over the public REST API.
//!
//! # Invariants
//! - The API key is sent as a query parameter and never appears in errors
//!   or logs.
//! - A reply without text parts is returned as an empty string so the
//!   caller's empty-reply fallback applies.

use crate::service::briefing::{GenerationError, TextGenerator};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const ERROR_BODY_MAX_CHARS: usize = 200;

/// `generateContent` client.
pub struct GeminiTextGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiTextGenerator {
    /// Builds a client. `timeout = None` leaves requests unbounded, which
    /// also lifts reqwest's 30 s blocking default.
    pub fn new(
        api_key: impl Into<String>,
        model: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GenerationError::Transport(err.without_url().to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string()),
            base_url: GEMINI_DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at another host (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl TextGenerator for GeminiTextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|err| GenerationError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(GenerationError::Status {
                code: status.as_u16(),
                body: text.chars().take(ERROR_BODY_MAX_CHARS).collect(),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|err| GenerationError::InvalidResponse(err.without_url().to_string()))?;
        Ok(parsed.first_text())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn first_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}
