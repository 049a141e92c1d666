//! Dialogue client for the remote chat model
//!
//! The explicit transcript inside each composed prompt is the only
//! conversation memory. Every request to the backend is a fresh single-turn
//! exchange, so the remote side never accumulates a second, possibly
//! diverging, history.

pub mod gemini;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::bounded::bounded;

pub use gemini::{GeminiBackend, GenerationConfig};
pub use retry::RetryPolicy;

/// Reply substituted when the model gives nothing usable
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response. Please try again.";

/// A remote chat model
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one prompt and wait for the complete reply
    ///
    /// `Ok(None)` means the service answered but the reply had no
    /// extractable text (blocked, empty candidates, missing parts).
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or a non-success status
    async fn generate(&self, prompt: &str) -> Result<Option<String>>;

    /// Check that the configured credential is accepted
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Credential`] when the key is rejected
    async fn verify(&self) -> Result<()> {
        Ok(())
    }

    /// Model identifier for logs and status
    fn model(&self) -> &str;
}

/// Session-long handle to the chat model
///
/// [`DialogueClient::send`] never fails: transport errors, timeouts and
/// empty replies all end in [`FALLBACK_REPLY`] after bounded retry.
pub struct DialogueClient {
    backend: Arc<dyn ChatBackend>,
    retry: RetryPolicy,
    timeout: Duration,
    exchanges: u64,
}

impl DialogueClient {
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            backend,
            retry,
            timeout,
            exchanges: 0,
        }
    }

    /// Send `prompt` and return the reply text or the fallback
    pub async fn send(&mut self, prompt: &str) -> String {
        self.exchanges += 1;
        let exchange = self.exchanges;
        let mut attempt = 0;

        loop {
            tracing::debug!(exchange, attempt, prompt_chars = prompt.len(), "sending prompt");

            match bounded("dialogue request", self.timeout, self.backend.generate(prompt)).await {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    tracing::debug!(exchange, reply_chars = text.len(), "reply received");
                    return text.trim().to_string();
                }
                Ok(_) => {
                    tracing::warn!(exchange, "reply had no text, using fallback");
                    return FALLBACK_REPLY.to_string();
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = retry::delay_for_attempt(&self.retry, attempt, e.retry_after());
                    tracing::warn!(
                        exchange,
                        attempt,
                        error = %e,
                        ?delay,
                        "dialogue request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        exchange,
                        attempt,
                        error = %e,
                        "dialogue request failed, using fallback"
                    );
                    return FALLBACK_REPLY.to_string();
                }
            }
        }
    }

    /// Verify the backend credential
    ///
    /// # Errors
    ///
    /// Propagates the backend's verification error
    pub async fn verify(&self) -> Result<()> {
        bounded("credential check", self.timeout, self.backend.verify()).await
    }

    /// Number of prompts sent this session
    #[must_use]
    pub const fn exchanges(&self) -> u64 {
        self.exchanges
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.backend.model()
    }
}

impl std::fmt::Debug for DialogueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueClient")
            .field("model", &self.model())
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .field("exchanges", &self.exchanges)
            .finish()
    }
}
