//! TOML configuration file loading
//!
//! Supports `~/.config/haven/config.toml` as a persistent config source.
//! Every field is optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HavenConfigFile {
    #[serde(default)]
    pub llm: LlmFileConfig,

    #[serde(default)]
    pub emotion: EmotionFileConfig,

    #[serde(default)]
    pub voice: VoiceFileConfig,

    #[serde(default)]
    pub timeouts: TimeoutsFileConfig,

    #[serde(default)]
    pub server: ServerFileConfig,

    #[serde(default)]
    pub persona: PersonaFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Dialogue model configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
    /// Extra attempts after a transient failure
    pub max_retries: Option<u32>,
}

/// Emotion classifier configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EmotionFileConfig {
    pub enabled: Option<bool>,
    /// Hugging Face model id
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// How many emotions go into the prompt
    pub top_k: Option<usize>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// "whisper" or "deepgram"
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// "openai" or "elevenlabs"
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// Voice catalog, addressed by index
    pub tts_voices: Option<Vec<String>>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Catalog index used when speaking replies to voice turns
    pub playback_voice: Option<usize>,

    /// Longest time the microphone waits for a phrase
    pub max_listen_secs: Option<u64>,
}

/// Deadlines for external calls, in seconds
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TimeoutsFileConfig {
    pub dialogue_secs: Option<u64>,
    pub emotion_secs: Option<u64>,
    pub capture_secs: Option<u64>,
    pub synthesis_secs: Option<u64>,
}

/// Web server configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerFileConfig {
    /// Listen address, e.g. "0.0.0.0" to reach the page from the LAN
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// Directory served under the chat page
    pub static_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PersonaFileConfig {
    /// Replaces the built-in instruction for this process
    pub instruction: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiKeysFileConfig {
    pub google: Option<String>,
    pub huggingface: Option<String>,
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
    pub deepgram: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `HavenConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> HavenConfigFile {
    config_file_path().map_or_else(HavenConfigFile::default, |path| load_config_file_from(&path))
}

/// Load a TOML config file from `path`, falling back to defaults
pub fn load_config_file_from(path: &Path) -> HavenConfigFile {
    if !path.exists() {
        return HavenConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                HavenConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            HavenConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/haven/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("haven").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_config_file_from(&dir.path().join("nope.toml"));
        assert!(fc.llm.model.is_none());
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm\nmodel = ").unwrap();

        let fc = load_config_file_from(&path);
        assert!(fc.llm.model.is_none());
    }

    #[test]
    fn partial_file_overlays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[llm]
model = "gemini-pro"

[voice]
tts_voices = ["a", "b", "c"]

[server]
port = 9000
"#,
        )
        .unwrap();

        let fc = load_config_file_from(&path);
        assert_eq!(fc.llm.model.as_deref(), Some("gemini-pro"));
        assert_eq!(fc.voice.tts_voices.map(|v| v.len()), Some(3));
        assert_eq!(fc.server.port, Some(9000));
        assert!(fc.emotion.enabled.is_none());
    }
}
