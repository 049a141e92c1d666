//! Session-scoped conversation transcript

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who said an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

impl Speaker {
    /// Label used when rendering the transcript and in prompt history lines
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Bot => "Bot",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One recorded line of dialogue
///
/// Fields are private so an utterance cannot change after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Utterance {
    speaker: Speaker,
    text: String,
    at: DateTime<Utc>,
}

impl Utterance {
    #[must_use]
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn speaker(&self) -> Speaker {
        self.speaker
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the utterance was recorded
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker, self.text)
    }
}

/// Ordered, append-only transcript of the active session
///
/// There is no removal or edit operation; insertion order is the transcript
/// sent to the model. Growth is unbounded for the life of the session.
#[derive(Debug, Default)]
pub struct ConversationStore {
    entries: Vec<Utterance>,
}

impl ConversationStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add one utterance at the end
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) {
        let utterance = Utterance::new(speaker, text);
        tracing::trace!(position = self.entries.len() + 1, %utterance, "transcript append");
        self.entries.push(utterance);
    }

    /// The full ordered transcript
    #[must_use]
    pub fn all(&self) -> &[Utterance] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
