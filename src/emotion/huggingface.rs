//! Hugging Face Inference API text-classification backend

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{EmotionClassifier, EmotionScore};
use crate::{Error, Result};

/// Default hosted inference endpoint
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Default emotion model (six labels: sadness, joy, love, anger, fear, surprise)
pub const DEFAULT_MODEL: &str = "bhadresh-savani/bert-base-uncased-emotion";

/// Label/score pair as returned by the pipeline
#[derive(Debug, Deserialize)]
struct RawScore {
    label: String,
    score: f64,
}

/// The API answers `[[{..}, ..]]` for a single input, some deployments `[{..}, ..]`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<RawScore>>),
    Flat(Vec<RawScore>),
}

impl ClassificationResponse {
    fn into_scores(self) -> Vec<EmotionScore> {
        let raw = match self {
            Self::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            Self::Flat(scores) => scores,
        };

        raw.into_iter()
            .map(|r| EmotionScore::new(r.label, r.score))
            .collect()
    }
}

/// Classifies text with a hosted Hugging Face model
pub struct HuggingFaceClassifier {
    client: reqwest::Client,
    api_token: SecretString,
    model: String,
    base_url: String,
}

impl HuggingFaceClassifier {
    /// Create a classifier for `model` on the hosted endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the API token is empty
    pub fn new(api_token: SecretString, model: String) -> Result<Self> {
        Self::with_base_url(api_token, model, DEFAULT_BASE_URL.to_string())
    }

    /// Create a classifier against a custom endpoint (self-hosted TGI, tests)
    ///
    /// # Errors
    ///
    /// Returns error if the API token is empty
    pub fn with_base_url(api_token: SecretString, model: String, base_url: String) -> Result<Self> {
        if api_token.expose_secret().is_empty() {
            return Err(Error::Config(
                "Hugging Face API token required for emotion classification".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_token,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EmotionClassifier for HuggingFaceClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<EmotionScore>> {
        tracing::debug!(model = %self.model, chars = text.len(), "classifying emotion");

        let url = format!("{}/models/{}", self.base_url, self.model);
        let body = serde_json::json!({
            "inputs": text,
            "options": { "wait_for_model": true },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "emotion request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "emotion API error");
            return Err(Error::Emotion(format!("inference API error {status}: {body}")));
        }

        let parsed: ClassificationResponse = response
            .json()
            .await
            .map_err(|e| Error::Emotion(format!("unexpected classification payload: {e}")))?;

        Ok(parsed.into_scores())
    }
}
