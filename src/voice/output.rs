//! Spoken output

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::Result;
use crate::bounded::{bounded, bounded_blocking};

/// Sink that speaks text aloud
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str, voice: Option<usize>) -> Result<()>;
}

/// Remote TTS played through the default output device
pub struct SpeakerOutput {
    tts: Arc<TextToSpeech>,
    synthesis_timeout: Duration,
}

impl SpeakerOutput {
    #[must_use]
    pub const fn new(tts: Arc<TextToSpeech>, synthesis_timeout: Duration) -> Self {
        Self {
            tts,
            synthesis_timeout,
        }
    }
}

#[async_trait]
impl SpeechOutput for SpeakerOutput {
    async fn speak(&self, text: &str, voice: Option<usize>) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let synthesis = self.tts.synthesize(text, voice);
        let mp3 = bounded("synthesis", self.synthesis_timeout, synthesis).await?;

        bounded_blocking("playback", playback_limit(self.synthesis_timeout), move || {
            AudioPlayback::new()?.play_mp3(&mp3)
        })
        .await
    }
}

/// The clip itself sets how long playback takes; allow generous slack
fn playback_limit(synthesis_timeout: Duration) -> Duration {
    synthesis_timeout.saturating_mul(4)
}
