//! Text-to-speech (TTS) processing

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

const OPENAI_URL: &str = "https://api.openai.com/v1/audio/speech";
const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Default `OpenAI` voices, addressed by index
pub const OPENAI_VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

/// Default ElevenLabs voices (Rachel, Adam), addressed by index
pub const ELEVENLABS_VOICES: &[&str] = &["21m00Tcm4TlvDq8ikWAM", "pNInz6obpgDQGcFmaJgB"];

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    OpenAI,
    ElevenLabs,
}

impl TtsProvider {
    /// Parse a provider name (`openai`, `elevenlabs`)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "elevenlabs" | "eleven_labs" => Some(Self::ElevenLabs),
            _ => None,
        }
    }

    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAI => "tts-1",
            Self::ElevenLabs => "eleven_monolingual_v1",
        }
    }

    #[must_use]
    pub fn default_voices(self) -> Vec<String> {
        let voices = match self {
            Self::OpenAI => OPENAI_VOICES,
            Self::ElevenLabs => ELEVENLABS_VOICES,
        };
        voices.iter().map(|v| (*v).to_string()).collect()
    }
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voices: Vec<String>,
    speed: f32,
    model: String,
    provider: TtsProvider,
    endpoint: String,
}

impl TextToSpeech {
    /// Create a new TTS instance
    ///
    /// An empty `voices` catalog falls back to the provider's defaults.
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(
        provider: TtsProvider,
        api_key: SecretString,
        model: String,
        voices: Vec<String>,
        speed: f32,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            let msg = match provider {
                TtsProvider::OpenAI => "OpenAI API key required for TTS",
                TtsProvider::ElevenLabs => "ElevenLabs API key required for TTS",
            };
            return Err(Error::Config(msg.to_string()));
        }

        let voices = if voices.is_empty() {
            provider.default_voices()
        } else {
            voices
        };

        let endpoint = match provider {
            TtsProvider::OpenAI => OPENAI_URL,
            TtsProvider::ElevenLabs => ELEVENLABS_URL,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voices,
            speed,
            model,
            provider,
            endpoint: endpoint.to_string(),
        })
    }

    /// Create a new TTS instance using `OpenAI` with its default voices
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: SecretString, speed: f32) -> Result<Self> {
        Self::new(
            TtsProvider::OpenAI,
            api_key,
            TtsProvider::OpenAI.default_model().to_string(),
            Vec::new(),
            speed,
        )
    }

    /// Point at a different endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn voices(&self) -> &[String] {
        &self.voices
    }

    /// Pick a voice from the catalog
    ///
    /// `None` or an out-of-range index selects the first voice.
    #[must_use]
    pub fn resolve_voice(&self, index: Option<usize>) -> &str {
        let fallback = self.voices.first().map_or("", String::as_str);
        match index {
            Some(i) => self.voices.get(i).map_or_else(
                || {
                    tracing::debug!(index = i, "voice index out of range, using default");
                    fallback
                },
                String::as_str,
            ),
            None => fallback,
        }
    }

    /// Synthesize text to speech
    ///
    /// Returns MP3 audio bytes.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str, voice: Option<usize>) -> Result<Vec<u8>> {
        let voice = self.resolve_voice(voice);
        tracing::debug!(chars = text.len(), voice, "synthesizing speech");

        match self.provider {
            TtsProvider::OpenAI => self.synthesize_openai(text, voice).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text, voice).await,
        }
    }

    async fn synthesize_openai(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    async fn synthesize_elevenlabs(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("{}/{voice}", self.endpoint.trim_end_matches('/'));

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
