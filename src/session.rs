//! The single live conversation
//!
//! A session owns the transcript and the dialogue client. It starts once at
//! process start (after the model credential checks out) and ends at exit;
//! nothing survives it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::dialogue::{ChatBackend, DialogueClient, GeminiBackend, RetryPolicy};
use crate::{Error, Result};

/// Transcript plus dialogue client for one run of the program
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    store: ConversationStore,
    dialogue: DialogueClient,
}

impl Session {
    /// Wrap an already-verified dialogue client
    #[must_use]
    pub fn new(dialogue: DialogueClient) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(session = %id, model = dialogue.model(), "session started");

        Self {
            id,
            started_at: Utc::now(),
            store: ConversationStore::new(),
            dialogue,
        }
    }

    /// Verify the backend credential, then start a session on it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] (or whatever the check reports) when the
    /// model service does not accept the key
    pub async fn start(dialogue: DialogueClient) -> Result<Self> {
        dialogue.verify().await?;
        Ok(Self::new(dialogue))
    }

    /// Build the Gemini client from configuration and start a session
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] if `GOOGLE_API_KEY` is missing or rejected
    pub async fn from_config(config: &Config) -> Result<Self> {
        let key = config
            .api_keys
            .google
            .as_ref()
            .map(|k| SecretString::from(k.expose_secret().to_string()))
            .ok_or_else(|| {
                let msg = "GOOGLE_API_KEY is required to start a chat session";
                Error::Credential(msg.to_string())
            })?;

        let backend: Arc<dyn ChatBackend> = Arc::new(GeminiBackend::with_base_url(
            key,
            config.llm.model.clone(),
            config.llm.generation,
            config.llm.base_url.clone(),
        )?);

        let retry = RetryPolicy {
            max_retries: config.llm.max_retries,
            ..RetryPolicy::default()
        };

        Self::start(DialogueClient::new(backend, retry, config.timeouts.dialogue)).await
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub const fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }

    pub const fn dialogue_mut(&mut self) -> &mut DialogueClient {
        &mut self.dialogue
    }

    #[must_use]
    pub const fn dialogue(&self) -> &DialogueClient {
        &self.dialogue
    }

    /// Tear the session down, discarding the transcript
    pub fn end(self) {
        let elapsed = (Utc::now() - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        tracing::info!(
            session = %self.id,
            entries = self.store.len(),
            exchanges = self.dialogue.exchanges(),
            ?elapsed,
            "session ended"
        );
    }
}
