//! Configuration management for Haven
//!
//! Every setting resolves env > `~/.config/haven/config.toml` > default.

pub mod file;

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::Persona;
use crate::dialogue::GenerationConfig;
use crate::dialogue::gemini;
use crate::emotion::{DEFAULT_TOP_K, huggingface};
use crate::voice::{SttProvider, TtsProvider};

use self::file::HavenConfigFile;

/// Default web server port
pub const DEFAULT_PORT: u16 = 8501;

/// Default listen address; loopback keeps the transcript on this machine
pub const DEFAULT_BIND: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Upper bound for any configured duration
pub const MAX_CONFIGURED_SECS: u64 = 3600;

/// Haven configuration
#[derive(Debug)]
pub struct Config {
    /// Persona instruction for this process
    pub persona: Persona,

    pub llm: LlmConfig,

    pub emotion: EmotionConfig,

    pub voice: VoiceConfig,

    pub timeouts: TimeoutConfig,

    pub server: ServerConfig,

    pub api_keys: ApiKeys,
}

/// Dialogue model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: String,

    /// REST base URL, overridable for proxies
    pub base_url: String,

    /// Sampling settings sent with every request
    pub generation: GenerationConfig,

    /// Extra attempts after a transient failure
    pub max_retries: u32,
}

/// Emotion classifier configuration
#[derive(Debug, Clone)]
pub struct EmotionConfig {
    /// Annotate prompts with detected emotions
    pub enabled: bool,

    /// Hugging Face model id
    pub model: String,

    pub base_url: String,

    /// Emotions kept per utterance
    pub top_k: usize,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input and spoken replies
    pub enabled: bool,

    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// Voice catalog; empty means the provider's defaults
    pub tts_voices: Vec<String>,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Catalog index used to speak replies to voice turns
    pub playback_voice: usize,

    /// Longest the microphone waits for a phrase
    pub max_listen: Duration,
}

/// Deadlines for calls that leave the process
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    pub dialogue: Duration,
    pub emotion: Duration,
    pub capture: Duration,
    pub synthesis: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            dialogue: Duration::from_secs(60),
            emotion: Duration::from_secs(15),
            capture: Duration::from_secs(30),
            synthesis: Duration::from_secs(30),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: IpAddr,

    /// Port to listen on
    pub port: u16,

    /// Path to extra static files served next to the chat page
    pub static_dir: Option<PathBuf>,
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// Google AI Studio key (dialogue model)
    pub google: Option<SecretString>,

    /// Hugging Face inference token (emotion classifier)
    pub huggingface: Option<SecretString>,

    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<SecretString>,
}

impl ApiKeys {
    /// Key for the configured STT provider
    #[must_use]
    pub const fn for_stt(&self, provider: SttProvider) -> Option<&SecretString> {
        match provider {
            SttProvider::Whisper => self.openai.as_ref(),
            SttProvider::Deepgram => self.deepgram.as_ref(),
        }
    }

    /// Key for the configured TTS provider
    #[must_use]
    pub const fn for_tts(&self, provider: TtsProvider) -> Option<&SecretString> {
        match provider {
            TtsProvider::OpenAI => self.openai.as_ref(),
            TtsProvider::ElevenLabs => self.elevenlabs.as_ref(),
        }
    }
}

impl Config {
    /// Load configuration from the environment and the config file
    #[must_use]
    pub fn load() -> Self {
        Self::load_with_options(false)
    }

    /// Load configuration, optionally forcing voice off
    #[must_use]
    pub fn load_with_options(disable_voice: bool) -> Self {
        let fc = file::load_config_file();
        Self::from_sources(fc, |name| std::env::var(name).ok(), disable_voice)
    }

    /// Resolve configuration from a parsed file and an env lookup
    ///
    /// Empty env values count as unset.
    #[must_use]
    pub fn from_sources<E>(fc: HavenConfigFile, env: E, disable_voice: bool) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());
        let secret = |name: &str, file: Option<String>| {
            lookup(name)
                .or(file.filter(|v| !v.trim().is_empty()))
                .map(SecretString::from)
        };

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            google: secret("GOOGLE_API_KEY", fc.api_keys.google),
            huggingface: secret("HF_API_TOKEN", fc.api_keys.huggingface),
            openai: secret("OPENAI_API_KEY", fc.api_keys.openai),
            elevenlabs: secret("ELEVENLABS_API_KEY", fc.api_keys.elevenlabs),
            deepgram: secret("DEEPGRAM_API_KEY", fc.api_keys.deepgram),
        };

        let defaults = GenerationConfig::default();
        let llm = LlmConfig {
            model: lookup("HAVEN_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
            base_url: fc
                .llm
                .base_url
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string()),
            generation: GenerationConfig {
                temperature: fc.llm.temperature.unwrap_or(defaults.temperature),
                top_p: fc.llm.top_p.unwrap_or(defaults.top_p),
                top_k: fc.llm.top_k.unwrap_or(defaults.top_k),
                max_output_tokens: fc.llm.max_output_tokens.unwrap_or(defaults.max_output_tokens),
            },
            max_retries: fc.llm.max_retries.unwrap_or(2),
        };

        let emotion = EmotionConfig {
            enabled: fc.emotion.enabled.unwrap_or(true),
            model: fc
                .emotion
                .model
                .unwrap_or_else(|| huggingface::DEFAULT_MODEL.to_string()),
            base_url: fc
                .emotion
                .base_url
                .unwrap_or_else(|| huggingface::DEFAULT_BASE_URL.to_string()),
            top_k: fc.emotion.top_k.unwrap_or(DEFAULT_TOP_K),
        };

        // Voice config (env > toml > default)
        let stt_provider = provider_or_default(
            fc.voice.stt_provider.as_deref(),
            SttProvider::from_name,
            SttProvider::Whisper,
            "stt_provider",
        );
        let tts_provider = provider_or_default(
            fc.voice.tts_provider.as_deref(),
            TtsProvider::from_name,
            TtsProvider::OpenAI,
            "tts_provider",
        );

        let disabled_by_env = lookup("HAVEN_DISABLE_VOICE").is_some_and(|v| is_truthy(&v));
        let voice_enabled = !(disable_voice || disabled_by_env) && fc.voice.enabled.unwrap_or(true);
        if disable_voice || disabled_by_env {
            tracing::info!("voice explicitly disabled");
        }

        let voice = VoiceConfig {
            enabled: voice_enabled,
            stt_provider,
            stt_model: lookup("HAVEN_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| stt_provider.default_model().to_string()),
            tts_provider,
            tts_model: lookup("HAVEN_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| tts_provider.default_model().to_string()),
            tts_voices: fc.voice.tts_voices.unwrap_or_default(),
            tts_speed: fc.voice.tts_speed.unwrap_or(1.0).clamp(0.25, 4.0),
            playback_voice: fc.voice.playback_voice.unwrap_or(1),
            max_listen: bounded_secs(fc.voice.max_listen_secs.unwrap_or(15)),
        };

        let default_timeouts = TimeoutConfig::default();
        let secs = |v: Option<u64>, d: Duration| v.filter(|s| *s > 0).map_or(d, bounded_secs);
        let timeouts = TimeoutConfig {
            dialogue: secs(fc.timeouts.dialogue_secs, default_timeouts.dialogue),
            emotion: secs(fc.timeouts.emotion_secs, default_timeouts.emotion),
            capture: secs(fc.timeouts.capture_secs, default_timeouts.capture),
            synthesis: secs(fc.timeouts.synthesis_secs, default_timeouts.synthesis),
        };

        // Server config (env > toml > default)
        let server = ServerConfig {
            bind: lookup("HAVEN_BIND")
                .or(fc.server.bind)
                .map_or(DEFAULT_BIND, |addr| {
                    addr.trim().parse().unwrap_or_else(|_| {
                        tracing::warn!(value = %addr, "invalid bind address, using loopback");
                        DEFAULT_BIND
                    })
                }),
            port: lookup("HAVEN_PORT")
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: lookup("HAVEN_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        let persona = Persona::new(fc.persona.instruction.as_deref());
        if !persona.is_default() {
            tracing::info!("using persona instruction from config file");
        }

        Self {
            persona,
            llm,
            emotion,
            voice,
            timeouts,
            server,
            api_keys,
        }
    }
}

fn provider_or_default<P: Copy>(
    name: Option<&str>,
    parse: fn(&str) -> Option<P>,
    default: P,
    field: &'static str,
) -> P {
    match name {
        None => default,
        Some(name) => parse(name).unwrap_or_else(|| {
            tracing::warn!(field, value = name, "unknown provider, using default");
            default
        }),
    }
}

fn bounded_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.min(MAX_CONFIGURED_SECS))
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}
