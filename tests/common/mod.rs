//! Shared test utilities
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use haven::dialogue::{ChatBackend, DialogueClient, RetryPolicy};
use haven::emotion::{EmotionAnnotator, EmotionClassifier, EmotionScore};
use haven::voice::{CaptureOutcome, SpeechInput, SpeechOutput};
use haven::{Error, InteractionController, Persona, Result, Session};

/// Reply used once a scripted backend runs out of answers
pub const DEFAULT_REPLY: &str = "That sounds hard. What has been on your mind?";

/// Chat backend that answers from a script and records every prompt
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<Option<String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(Some(text.to_string())))
    }

    pub fn empty(self) -> Self {
        self.push(Ok(None))
    }

    pub fn fail(self, error: Error) -> Self {
        self.push(Err(error))
    }

    fn push(self, item: Result<Option<String>>) -> Self {
        self.replies.lock().unwrap().push_back(item);
        self
    }

    /// Handle to the prompts sent so far
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Some(DEFAULT_REPLY.to_string())))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Classifier that always returns the same scores
pub struct FixedClassifier(pub Vec<EmotionScore>);

#[async_trait]
impl EmotionClassifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Result<Vec<EmotionScore>> {
        Ok(self.0.clone())
    }
}

/// Classifier that always errors
pub struct FailingClassifier;

#[async_trait]
impl EmotionClassifier for FailingClassifier {
    async fn classify(&self, _text: &str) -> Result<Vec<EmotionScore>> {
        Err(Error::Emotion("model loading".to_string()))
    }
}

/// Speech input that replays scripted outcomes
pub struct ScriptedInput {
    outcomes: Mutex<VecDeque<CaptureOutcome>>,
}

impl ScriptedInput {
    pub fn new(outcomes: Vec<CaptureOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
        }
    }
}

#[async_trait]
impl SpeechInput for ScriptedInput {
    async fn listen(&self) -> CaptureOutcome {
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(CaptureOutcome::NoMatch)
    }
}

/// Speech output that records what it was asked to say
#[derive(Default)]
pub struct RecordingOutput {
    pub spoken: Mutex<Vec<(String, Option<usize>)>>,
    pub fail: bool,
}

impl RecordingOutput {
    pub fn failing() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn spoken(&self) -> Vec<(String, Option<usize>)> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechOutput for RecordingOutput {
    async fn speak(&self, text: &str, voice: Option<usize>) -> Result<()> {
        if self.fail {
            return Err(Error::Audio("no output device available".to_string()));
        }
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), voice));
        Ok(())
    }
}

/// Dialogue client over `backend` with fast, bounded retry
pub fn dialogue(backend: Arc<dyn ChatBackend>) -> DialogueClient {
    let retry = RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    };
    DialogueClient::new(backend, retry, Duration::from_secs(5))
}

/// Text-only controller with the default persona
pub fn controller(
    backend: Arc<dyn ChatBackend>,
    annotator: EmotionAnnotator,
) -> InteractionController {
    InteractionController::new(Persona::default(), Session::new(dialogue(backend)), annotator)
}

/// Annotator over fixed scores
pub fn annotator(scores: Vec<EmotionScore>) -> EmotionAnnotator {
    EmotionAnnotator::new(Arc::new(FixedClassifier(scores)), 2, Duration::from_secs(1))
}
