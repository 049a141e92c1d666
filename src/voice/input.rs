//! Spoken input as a single "listen once" call

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::capture::{SAMPLE_RATE, record_phrase, samples_to_wav};
use super::stt::SpeechToText;
use crate::bounded::{bounded, bounded_blocking};

/// Result of one listen attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Speech was heard and transcribed
    Recognized(String),
    /// Nothing intelligible was heard
    NoMatch,
    /// Microphone or recognition service failed
    ServiceUnavailable(String),
}

/// Source of one spoken phrase at a time
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Listen for one phrase and transcribe it
    async fn listen(&self) -> CaptureOutcome;
}

/// Default microphone plus a remote STT service
pub struct MicrophoneInput {
    stt: Arc<SpeechToText>,
    max_listen: Duration,
    capture_timeout: Duration,
    stt_timeout: Duration,
}

impl MicrophoneInput {
    /// `max_listen` caps how long the microphone stays open waiting for a
    /// phrase; `capture_timeout` bounds the whole recording step.
    #[must_use]
    pub const fn new(
        stt: Arc<SpeechToText>,
        max_listen: Duration,
        capture_timeout: Duration,
        stt_timeout: Duration,
    ) -> Self {
        Self {
            stt,
            max_listen,
            capture_timeout,
            stt_timeout,
        }
    }
}

#[async_trait]
impl SpeechInput for MicrophoneInput {
    async fn listen(&self) -> CaptureOutcome {
        let max_listen = self.max_listen;
        let recorded = bounded_blocking("capture", self.capture_timeout, move || {
            record_phrase(max_listen)
        })
        .await;

        let samples = match recorded {
            Ok(samples) => samples,
            Err(e) if e.is_timeout() => return CaptureOutcome::NoMatch,
            Err(e) => {
                tracing::warn!(error = %e, "microphone unavailable");
                return CaptureOutcome::ServiceUnavailable(e.to_string());
            }
        };

        if samples.is_empty() {
            tracing::debug!("no speech heard");
            return CaptureOutcome::NoMatch;
        }

        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => return CaptureOutcome::ServiceUnavailable(e.to_string()),
        };

        match bounded("transcription", self.stt_timeout, self.stt.transcribe(&wav)).await {
            Ok(text) if text.trim().is_empty() => CaptureOutcome::NoMatch,
            Ok(text) => CaptureOutcome::Recognized(text.trim().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "speech recognition failed");
                CaptureOutcome::ServiceUnavailable(e.to_string())
            }
        }
    }
}
