//! Google Gemini REST backend (`generateContent`)

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::ChatBackend;
use super::retry::{is_recoverable_status, parse_retry_delay};
use crate::{Error, Result};

/// Public Gemini API root
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const SERVICE: &str = "gemini";

/// Harm categories that are all set to `BLOCK_NONE`
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Sampling settings sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            top_k: 1,
            max_output_tokens: 400,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
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

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn into_text(self) -> Option<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            tracing::warn!(reason, "prompt blocked by model");
        }

        let candidate = self.candidates.into_iter().next()?;
        if let Some(reason) = &candidate.finish_reason {
            tracing::trace!(reason, "candidate finished");
        }

        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        (!text.is_empty()).then_some(text)
    }
}

/// Gemini chat backend
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    generation: GenerationConfig,
}

impl GeminiBackend {
    /// Create a backend against the public API
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] if the API key is empty
    pub fn new(api_key: SecretString, model: String, generation: GenerationConfig) -> Result<Self> {
        Self::with_base_url(api_key, model, generation, DEFAULT_BASE_URL.to_string())
    }

    /// Create a backend against a custom API root
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] if the API key is empty
    pub fn with_base_url(
        api_key: SecretString,
        model: String,
        generation: GenerationConfig,
        base_url: String,
    ) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(Error::Credential(
                "GOOGLE_API_KEY is required to start a chat session".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            generation,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let request = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: self.generation,
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}:generateContent", self.model_url()))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Gemini request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");

            if is_recoverable_status(status.as_u16()) {
                return Err(Error::ServiceUnavailable {
                    service: SERVICE,
                    retry_after: parse_retry_delay(&body),
                    message: format!("{status}: {body}"),
                });
            }
            return Err(Error::Dialogue(format!("Gemini API error {status}: {body}")));
        }

        // A body that is not the documented shape counts as "no text"
        let body = response.text().await?;
        let parsed: GenerateContentResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "malformed Gemini response");
                return Ok(None);
            }
        };

        Ok(parsed.into_text())
    }

    async fn verify(&self) -> Result<()> {
        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(model = %self.model, "Gemini credential accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            400 | 401 | 403 => Err(Error::Credential(format!(
                "Google API key rejected ({status}): {body}"
            ))),
            404 => Err(Error::Config(format!("unknown Gemini model: {}", self.model))),
            _ => Err(Error::Dialogue(format!(
                "credential check failed ({status}): {body}"
            ))),
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_matches_api_shape() {
        let request = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: "hello" }],
            }],
            generation_config: GenerationConfig::default(),
            safety_settings: vec![SafetySetting {
                category: HARM_CATEGORIES[0],
                threshold: "BLOCK_NONE",
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 400);
        assert_eq!(json["generationConfig"]["topK"], 1);
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_NONE");
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"friend."}]},"finishReason":"STOP"},
                       {"content":{"parts":[{"text":"ignored"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("Hello, friend."));
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let json = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_text(), None);
    }

    #[test]
    fn candidate_without_parts_has_no_text() {
        let json = r#"{"candidates":[{"finishReason":"MAX_TOKENS","content":{}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_text(), None);
    }

    #[test]
    fn empty_key_is_a_credential_error() {
        let result = GeminiBackend::new(
            SecretString::from("  ".to_string()),
            DEFAULT_MODEL.to_string(),
            GenerationConfig::default(),
        );
        assert!(matches!(result, Err(Error::Credential(_))));
    }
}
