//! Generation client: one `generateContent` call per trigger.
//!
//! The request is a single user turn. A response without any candidate,
//! content, part or text is a valid-but-empty answer and yields `Ok(None)`;
//! only transport failures and non-success statuses are errors. There are no
//! retries, no streaming and no cancellation.

use crate::config::GeneratorConfig;
use crate::error::DocGenError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Sends a composed prompt and returns the generated text, if any.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, DocGenError>;
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response body; every level is optional so partial answers still decode.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate.
    pub fn first_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
    }
}

/// Build the JSON request body for `prompt`.
pub fn request_body(prompt: &str) -> serde_json::Value {
    let body = GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![RequestPart { text: prompt }],
        }],
    };
    // Serialising plain structs of strings cannot fail.
    serde_json::to_value(body).unwrap_or_default()
}

// ── HTTP client ──────────────────────────────────────────────────────────

/// [`Generator`] speaking the generative-language REST API over reqwest.
///
/// The request URL carries the API key, so errors are stripped of it.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

impl GenerationClient {
    pub fn new(config: &GeneratorConfig) -> Result<Self, DocGenError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| DocGenError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: config.generate_url(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Generator for GenerationClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, DocGenError> {
        let start = Instant::now();
        info!(
            "Requesting generation from '{}' ({} prompt chars)",
            self.model,
            prompt.chars().count()
        );

        let response = self
            .http
            .post(&self.url)
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(|e| DocGenError::GenerationTransport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocGenError::GenerationStatus {
                status: status.as_u16(),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DocGenError::GenerationDecode(e.without_url().to_string()))?;

        let text = body.first_text();
        debug!(
            "Generation finished in {:?}: {}",
            start.elapsed(),
            match &text {
                Some(t) => format!("{} chars", t.len()),
                None => "no candidate text".to_string(),
            }
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<String> {
        serde_json::from_str::<GenerateResponse>(json)
            .unwrap()
            .first_text()
    }

    #[test]
    fn request_is_single_user_turn() {
        let body = request_body("hola");
        assert_eq!(
            body,
            serde_json::json!({"contents":[{"role":"user","parts":[{"text":"hola"}]}]})
        );
    }

    #[test]
    fn extracts_first_candidate_first_part() {
        let json = r#"{"candidates":[
            {"content":{"parts":[{"text":"first"},{"text":"second"}]}},
            {"content":{"parts":[{"text":"other"}]}}]}"#;
        assert_eq!(parse(json).as_deref(), Some("first"));
    }

    #[test]
    fn empty_shapes_are_none() {
        assert_eq!(parse("{}"), None);
        assert_eq!(parse(r#"{"candidates":[]}"#), None);
        assert_eq!(parse(r#"{"candidates":[{}]}"#), None);
        assert_eq!(parse(r#"{"candidates":[{"content":{}}]}"#), None);
        assert_eq!(parse(r#"{"candidates":[{"content":{"parts":[]}}]}"#), None);
        assert_eq!(parse(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#), None);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{"candidates":[{"finishReason":"STOP","content":{"role":"model","parts":[{"text":"ok"}]}}],"usageMetadata":{}}"#;
        assert_eq!(parse(json).as_deref(), Some("ok"));
    }
}
