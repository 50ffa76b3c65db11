//! Completion-service client
//!
//! Thin client for an OpenAI-compatible chat-completions and image-generations
//! API, used to classify questions on creation, grade them on demand, and
//! suggest replacements. The base URL is injected from configuration so tests
//! can point it at a mock server.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::config::CompletionConfig;

/// Errors raised by completion-service calls.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion service is not configured; set QUESTBOARD_COMPLETION_API_KEY")]
    NotConfigured,
    #[error("completion request failed with status {status}")]
    Upstream { status: u16, body: String },
    #[error("network error calling completion service: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected completion response shape: {0}")]
    Malformed(String),
}

/// Classification result for a question statement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Classification {
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub score: Option<i32>,
}

/// Grading result for a question statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Evaluation {
    pub score: Option<i32>,
    pub summary: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Suggested replacement question.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Suggestion {
    pub question: Option<String>,
    pub rationale: Option<String>,
    #[serde(rename = "imagePrompt")]
    pub image_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

const CLASSIFY_SYSTEM_PROMPT: &str = "\
You are a pedagogy assistant for early primary school (grades 1 to 5).
Given a math question statement, classify it:
- topic: one short word (e.g. Addition, Fractions, Geometry)
- difficulty: EASY | MEDIUM | HARD (always relative to early primary school)
- score: 0-100 rating clarity/adequacy for that level.
Return only JSON { \"topic\": \"...\", \"difficulty\": \"...\", \"score\": 85 }.";

const EVALUATE_SYSTEM_PROMPT: &str = "\
You are a pedagogy reviewer focused on early primary school (grades 1 to 5).
Judge whether the question is clear, adequate, and well calibrated for that level.
Answer in JSON with fields: score (0-100), summary (short string), suggestions (array of strings).
Take the topic and difficulty into account when provided.";

const SUGGEST_SYSTEM_PROMPT: &str = "\
You create new math questions for early primary school (grades 1 to 5).
Suggest a new question based on the original, clear and appropriate for that level.
Answer ONLY in JSON with fields:
{ \"question\": \"new question\", \"rationale\": \"why it fits / how it improves\", \"imagePrompt\": \"simple visual description (optional)\" }";

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").expect("valid code fence regex"));

/// Strip markdown code fences that models wrap around JSON output.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Client for the completion service.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
    image_model: String,
}

impl CompletionClient {
    /// Create a new client from configuration.
    pub fn new(config: &CompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            image_model: config.image_model.clone(),
        }
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_ref().ok_or(CompletionError::NotConfigured)?;

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user },
                ],
                "temperature": temperature,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Malformed("no choices in response".to_string()))?;

        Ok(content)
    }

    /// Classify a question statement.
    ///
    /// Best-effort: returns `None` when the service is unconfigured, the call
    /// fails, or the model output cannot be parsed. Question creation must
    /// never fail because classification did.
    pub async fn classify(&self, statement: &str) -> Option<Classification> {
        if !self.is_configured() || statement.trim().is_empty() {
            return None;
        }

        let content = match self.chat(CLASSIFY_SYSTEM_PROMPT, statement, 0.2).await {
            Ok(content) => content,
            Err(err) => {
                warn!("Question classification failed: {}", err);
                return None;
            }
        };

        match serde_json::from_str(&strip_code_fences(&content)) {
            Ok(classification) => Some(classification),
            Err(err) => {
                warn!("Unparseable classification output: {}", err);
                None
            }
        }
    }

    /// Grade a question statement, optionally considering a student answer
    /// and the current topic/difficulty labels.
    pub async fn evaluate(
        &self,
        statement: &str,
        answer: Option<&str>,
        topic: Option<&str>,
        difficulty: Option<&str>,
    ) -> Result<Evaluation, CompletionError> {
        let mut user = format!("Question: {}\n", statement);
        if let Some(answer) = answer {
            user.push_str(&format!("Student answer: {}\n", answer));
        }
        if let Some(topic) = topic {
            user.push_str(&format!("Topic: {}\n", topic));
        }
        if let Some(difficulty) = difficulty {
            user.push_str(&format!("Difficulty: {}\n", difficulty));
        }

        let content = self.chat(EVALUATE_SYSTEM_PROMPT, &user, 0.2).await?;
        let cleaned = strip_code_fences(&content);

        // Models occasionally answer in prose; degrade to a summary-only
        // evaluation instead of failing the request.
        Ok(serde_json::from_str(&cleaned).unwrap_or(Evaluation {
            score: None,
            summary: Some(cleaned),
            suggestions: Vec::new(),
        }))
    }

    /// Suggest a replacement question based on an existing one.
    pub async fn suggest(
        &self,
        statement: &str,
        topic: Option<&str>,
        difficulty: Option<&str>,
    ) -> Result<Suggestion, CompletionError> {
        let mut user = format!("Original question: {}\n", statement);
        if let Some(topic) = topic {
            user.push_str(&format!("Topic: {}\n", topic));
        }
        if let Some(difficulty) = difficulty {
            user.push_str(&format!("Difficulty: {}\n", difficulty));
        }

        let content = self.chat(SUGGEST_SYSTEM_PROMPT, &user, 0.4).await?;
        let cleaned = strip_code_fences(&content);

        Ok(serde_json::from_str(&cleaned).unwrap_or(Suggestion {
            question: Some(cleaned),
            rationale: None,
            image_prompt: None,
        }))
    }

    /// Render an illustration for the given prompt, returning base64 image
    /// data.
    pub async fn generate_image(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_ref().ok_or(CompletionError::NotConfigured)?;

        let response = self
            .http
            .post(format!("{}/images/generations", self.api_base))
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.image_model,
                "prompt": prompt,
                "size": "1024x1024",
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ImageResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .and_then(|datum| datum.b64_json)
            .ok_or_else(|| CompletionError::Malformed("no image data in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences_removes_json_fence() {
        let fenced = "```json\n{\"topic\": \"Addition\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"topic\": \"Addition\"}");
    }

    #[test]
    fn test_strip_code_fences_removes_bare_fence() {
        let fenced = "```\n{\"score\": 90}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"score\": 90}");
    }

    #[test]
    fn test_strip_code_fences_is_case_insensitive() {
        let fenced = "```JSON\n{}\n```";
        assert_eq!(strip_code_fences(fenced), "{}");
    }

    #[test]
    fn test_strip_code_fences_passes_plain_text() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_unconfigured_client_reports_not_configured() {
        let client = CompletionClient::new(&CompletionConfig::default());
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn test_classify_without_key_returns_none() {
        let client = CompletionClient::new(&CompletionConfig::default());
        assert!(client.classify("What is 2 + 2?").await.is_none());
    }

    #[tokio::test]
    async fn test_classify_blank_statement_returns_none() {
        let mut config = CompletionConfig::default();
        config.api_key = Some("sk-test".to_string());
        let client = CompletionClient::new(&config);
        assert!(client.classify("   ").await.is_none());
    }
}
