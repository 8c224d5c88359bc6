// Gemini client
// Calls Google's generateContent endpoint with a blocking reqwest client

use super::LanguageModel;
use crate::config::ModelConfig;
use crate::error::SynthesisError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Request body: a single user turn with one text part
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response body, reduced to the fields we read
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Blocking Gemini client
///
/// Uses reqwest's default timeouts; there is no retry or backoff, a failed
/// call is reported to the caller as-is
pub struct GeminiClient {
    config: ModelConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }
}

impl LanguageModel for GeminiClient {
    #[tracing::instrument(skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    fn complete(&self, prompt: &str) -> Result<String, SynthesisError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = response.json()?;
        extract_text(body)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Concatenate the text parts of the first candidate
///
/// A response without candidates (e.g. blocked by safety filters) or with
/// only empty parts counts as no usable text
fn extract_text(response: GenerateResponse) -> Result<String, SynthesisError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(SynthesisError::EmptyResponse)
    } else {
        Ok(text)
    }
}
