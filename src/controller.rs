//! Turn orchestration
//!
//! One turn runs `Idle → CapturingInput → Annotating → Composing →
//! AwaitingReply → Rendering → Idle`. Typed turns skip capture. The
//! controller takes `&mut self` for a whole turn, so callers that share it
//! (the web server) serialize turns behind a lock and no turn can overlap
//! another.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::Result;
use crate::config::Config;
use crate::conversation::{ConversationStore, Speaker, Utterance};
use crate::emotion::{EmotionAnnotator, EmotionScore, HuggingFaceClassifier};
use crate::persona::{GREETING, Persona};
use crate::prompt::compose_prompt;
use crate::session::Session;
use crate::voice::{
    CaptureOutcome, MicrophoneInput, SpeakerOutput, SpeechInput, SpeechOutput, SpeechToText,
    TextToSpeech,
};

/// Shown while the microphone is open
pub const LISTENING_NOTICE: &str = "Listening...";

/// Shown when nothing intelligible was heard
pub const NO_MATCH_NOTICE: &str = "Sorry, I did not understand that.";

/// Shown when the microphone or recognition service failed
pub const SERVICE_UNAVAILABLE_NOTICE: &str =
    "Could not request results; check your network connection.";

/// Shown when voice is not configured
pub const VOICE_DISABLED_NOTICE: &str = "Voice input is not available.";

/// Echo of recognized speech
#[must_use]
pub fn you_said(text: &str) -> String {
    format!("You said: {text}")
}

/// Where the controller is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    CapturingInput,
    Annotating,
    Composing,
    AwaitingReply,
    Rendering,
}

/// How the user's text arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrigin {
    Typed,
    Voice,
}

/// What a trigger produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// A user and a bot entry were recorded
    Completed {
        origin: TurnOrigin,
        user: String,
        reply: String,
        emotions: Vec<EmotionScore>,
        /// Whether the reply was played aloud
        spoken: bool,
    },
    /// Nothing recorded; show `notice` inline
    Aborted { notice: String },
    /// Empty input, nothing to do
    Ignored,
}

impl TurnOutcome {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Inline notice for an aborted turn
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        match self {
            Self::Aborted { notice } => Some(notice),
            _ => None,
        }
    }
}

/// Owns the session and drives every turn
pub struct InteractionController {
    persona: Persona,
    session: Session,
    annotator: EmotionAnnotator,
    input: Option<Arc<dyn SpeechInput>>,
    output: Option<Arc<dyn SpeechOutput>>,
    playback_voice: Option<usize>,
    state: TurnState,
    turns: u64,
}

impl InteractionController {
    /// Text-only controller
    #[must_use]
    pub fn new(persona: Persona, session: Session, annotator: EmotionAnnotator) -> Self {
        Self {
            persona,
            session,
            annotator,
            input: None,
            output: None,
            playback_voice: Some(1),
            state: TurnState::Idle,
            turns: 0,
        }
    }

    /// Attach speech input and output
    ///
    /// `playback_voice` is the catalog index used for every spoken reply.
    #[must_use]
    pub fn with_voice(
        mut self,
        input: Arc<dyn SpeechInput>,
        output: Arc<dyn SpeechOutput>,
        playback_voice: Option<usize>,
    ) -> Self {
        self.input = Some(input);
        self.output = Some(output);
        self.playback_voice = playback_voice;
        self
    }

    /// Build the full controller from configuration
    ///
    /// Voice and emotion annotation degrade to "off" when their keys are
    /// missing; only the dialogue credential is required.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Credential`] if the dialogue model key is
    /// missing or rejected
    pub async fn from_config(config: &Config) -> Result<Self> {
        let session = Session::from_config(config).await?;
        let annotator = build_annotator(config);
        let controller = Self::new(config.persona.clone(), session, annotator);

        match build_voice(config) {
            Some((input, output)) => Ok(controller.with_voice(
                input,
                output,
                Some(config.voice.playback_voice),
            )),
            None => Ok(controller),
        }
    }

    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    /// Full transcript, oldest first
    #[must_use]
    pub fn history(&self) -> &[Utterance] {
        self.session.store().all()
    }

    #[must_use]
    pub const fn store(&self) -> &ConversationStore {
        self.session.store()
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Greeting to show while nothing has been said yet
    #[must_use]
    pub fn greeting(&self) -> Option<&'static str> {
        self.session.store().is_empty().then_some(GREETING)
    }

    #[must_use]
    pub const fn voice_enabled(&self) -> bool {
        self.input.is_some()
    }

    #[must_use]
    pub const fn emotion_enabled(&self) -> bool {
        self.annotator.is_enabled()
    }

    /// Completed turns this session
    #[must_use]
    pub const fn turns(&self) -> u64 {
        self.turns
    }

    /// Run a typed turn
    pub async fn submit_text(&mut self, text: &str) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("ignoring empty input");
            return TurnOutcome::Ignored;
        }
        self.run_turn(text.to_string(), TurnOrigin::Typed).await
    }

    /// Run a spoken turn: listen once, then proceed as for typed text
    pub async fn speak(&mut self) -> TurnOutcome {
        let Some(input) = self.input.clone() else {
            return TurnOutcome::Aborted {
                notice: VOICE_DISABLED_NOTICE.to_string(),
            };
        };

        self.transition(TurnState::CapturingInput);
        let outcome = input.listen().await;

        let text = match outcome {
            CaptureOutcome::Recognized(text) if !text.trim().is_empty() => text,
            CaptureOutcome::Recognized(_) | CaptureOutcome::NoMatch => {
                return self.abort(NO_MATCH_NOTICE);
            }
            CaptureOutcome::ServiceUnavailable(reason) => {
                tracing::warn!(reason = %reason, "speech capture failed");
                return self.abort(SERVICE_UNAVAILABLE_NOTICE);
            }
        };

        tracing::info!("{}", you_said(&text));
        self.run_turn(text.trim().to_string(), TurnOrigin::Voice).await
    }

    /// End the session
    pub fn shutdown(self) {
        self.session.end();
    }

    async fn run_turn(&mut self, user: String, origin: TurnOrigin) -> TurnOutcome {
        self.transition(TurnState::Annotating);
        let emotions = self.annotator.classify(&user).await;

        self.transition(TurnState::Composing);
        let prompt = compose_prompt(
            self.persona.instruction(),
            self.session.store().all(),
            &user,
            &emotions,
        );

        self.transition(TurnState::AwaitingReply);
        let reply = self.session.dialogue_mut().send(&prompt).await;

        self.transition(TurnState::Rendering);
        let store = self.session.store_mut();
        store.append(Speaker::User, user.clone());
        store.append(Speaker::Bot, reply.clone());
        self.turns += 1;

        let spoken = if origin == TurnOrigin::Voice {
            self.play(&reply).await
        } else {
            false
        };

        self.transition(TurnState::Idle);
        tracing::info!(turn = self.turns, origin = ?origin, spoken, "turn complete");

        TurnOutcome::Completed {
            origin,
            user,
            reply,
            emotions,
            spoken,
        }
    }

    async fn play(&self, reply: &str) -> bool {
        let Some(output) = &self.output else {
            return false;
        };

        match output.speak(reply, self.playback_voice).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "could not speak reply");
                false
            }
        }
    }

    fn abort(&mut self, notice: &str) -> TurnOutcome {
        self.transition(TurnState::Idle);
        tracing::info!(notice, "turn aborted");
        TurnOutcome::Aborted {
            notice: notice.to_string(),
        }
    }

    fn transition(&mut self, next: TurnState) {
        tracing::debug!(from = ?self.state, to = ?next, "turn state");
        self.state = next;
    }
}

impl std::fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("session", &self.session.id())
            .field("state", &self.state)
            .field("turns", &self.turns)
            .field("voice", &self.voice_enabled())
            .field("emotion", &self.emotion_enabled())
            .finish_non_exhaustive()
    }
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

/// Emotion annotator from configuration, disabled without a token
#[must_use]
pub fn build_annotator(config: &Config) -> EmotionAnnotator {
    if !config.emotion.enabled {
        tracing::info!("emotion annotation disabled");
        return EmotionAnnotator::disabled();
    }

    let Some(token) = config.api_keys.huggingface.as_ref() else {
        tracing::warn!("HF_API_TOKEN not set, emotion annotation disabled");
        return EmotionAnnotator::disabled();
    };

    match HuggingFaceClassifier::with_base_url(
        copy_secret(token),
        config.emotion.model.clone(),
        config.emotion.base_url.clone(),
    ) {
        Ok(classifier) => EmotionAnnotator::new(
            Arc::new(classifier),
            config.emotion.top_k,
            config.timeouts.emotion,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "emotion classifier unavailable");
            EmotionAnnotator::disabled()
        }
    }
}

/// Microphone input and speaker output from configuration
///
/// Returns `None` when voice is disabled or a provider key is missing.
#[must_use]
pub fn build_voice(config: &Config) -> Option<(Arc<dyn SpeechInput>, Arc<dyn SpeechOutput>)> {
    let voice = &config.voice;
    if !voice.enabled {
        return None;
    }

    let Some(stt_key) = config.api_keys.for_stt(voice.stt_provider) else {
        tracing::warn!(provider = ?voice.stt_provider, "no STT key, voice disabled");
        return None;
    };
    let Some(tts_key) = config.api_keys.for_tts(voice.tts_provider) else {
        tracing::warn!(provider = ?voice.tts_provider, "no TTS key, voice disabled");
        return None;
    };

    let stt = SpeechToText::new(voice.stt_provider, copy_secret(stt_key), voice.stt_model.clone());
    let tts = TextToSpeech::new(
        voice.tts_provider,
        copy_secret(tts_key),
        voice.tts_model.clone(),
        voice.tts_voices.clone(),
        voice.tts_speed,
    );

    match (stt, tts) {
        (Ok(stt), Ok(tts)) => {
            // Recognition shares the synthesis deadline
            let input = MicrophoneInput::new(
                Arc::new(stt),
                voice.max_listen,
                capture_limit(config.timeouts.capture, voice.max_listen),
                config.timeouts.synthesis,
            );
            let output = SpeakerOutput::new(Arc::new(tts), config.timeouts.synthesis);
            tracing::info!(
                stt = ?voice.stt_provider,
                tts = ?voice.tts_provider,
                "voice enabled"
            );
            Some((Arc::new(input), Arc::new(output)))
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "voice unavailable");
            None
        }
    }
}

/// The capture deadline always outlasts the listen window
fn capture_limit(capture: Duration, max_listen: Duration) -> Duration {
    capture.max(max_listen.saturating_add(Duration::from_secs(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_limit_outlasts_listen_window() {
        let limit = capture_limit(Duration::from_secs(5), Duration::from_secs(15));
        assert_eq!(limit, Duration::from_secs(16));

        let limit = capture_limit(Duration::from_secs(30), Duration::from_secs(15));
        assert_eq!(limit, Duration::from_secs(30));
    }

    #[test]
    fn capture_limit_saturates() {
        assert_eq!(capture_limit(Duration::ZERO, Duration::MAX), Duration::MAX);
    }
}
