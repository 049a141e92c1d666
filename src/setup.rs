//! Interactive first-run setup wizard (`haven setup`)

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Select};

use crate::config::file::{self, EmotionFileConfig, HavenConfigFile, LlmFileConfig, VoiceFileConfig};
use crate::dialogue::gemini;

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Haven Setup\n");

    // Load existing config if present
    let existing = file::load_config_file();
    let config_path = file::config_file_path()
        .unwrap_or_else(|| PathBuf::from("~/.config/haven/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    let mut api_keys = existing.api_keys;

    // 1. Dialogue model key (required)
    api_keys.google = ask_key("Google AI Studio", "GOOGLE_API_KEY", api_keys.google)?;
    if api_keys.google.is_none() {
        println!("Without GOOGLE_API_KEY haven cannot start; set it in the environment later.");
    }

    let default_model = existing
        .llm
        .model
        .clone()
        .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());
    let model: String = Input::new()
        .with_prompt("Gemini model")
        .default(default_model)
        .interact_text()?;

    // 2. Emotion annotation (optional)
    let enable_emotion = Confirm::new()
        .with_prompt("Annotate messages with detected emotions (Hugging Face)?")
        .default(existing.emotion.enabled.unwrap_or(true))
        .interact()?;
    if enable_emotion {
        api_keys.huggingface = ask_key("Hugging Face", "HF_API_TOKEN", api_keys.huggingface)?;
    }

    // 3. Voice (optional)
    let enable_voice = Confirm::new()
        .with_prompt("Enable voice (microphone input, spoken replies)?")
        .default(existing.voice.enabled.unwrap_or(true))
        .interact()?;

    let voice = if enable_voice {
        let stt_providers = ["whisper", "deepgram"];
        let stt_idx = Select::new()
            .with_prompt("Speech recognition provider")
            .items(&stt_providers)
            .default(default_index(&stt_providers, existing.voice.stt_provider.as_deref()))
            .interact()?;

        let tts_providers = ["openai", "elevenlabs"];
        let tts_idx = Select::new()
            .with_prompt("Speech synthesis provider")
            .items(&tts_providers)
            .default(default_index(&tts_providers, existing.voice.tts_provider.as_deref()))
            .interact()?;

        let needs_openai = stt_idx == 0 || tts_idx == 0;
        if needs_openai {
            api_keys.openai = ask_key("OpenAI", "OPENAI_API_KEY", api_keys.openai)?;
        }
        if stt_idx == 1 {
            api_keys.deepgram = ask_key("Deepgram", "DEEPGRAM_API_KEY", api_keys.deepgram)?;
        }
        if tts_idx == 1 {
            api_keys.elevenlabs = ask_key("ElevenLabs", "ELEVENLABS_API_KEY", api_keys.elevenlabs)?;
        }

        VoiceFileConfig {
            enabled: Some(true),
            stt_provider: Some(stt_providers[stt_idx].to_string()),
            tts_provider: Some(tts_providers[tts_idx].to_string()),
            ..existing.voice
        }
    } else {
        VoiceFileConfig {
            enabled: Some(false),
            ..existing.voice
        }
    };

    // 4. Build and write config
    let config_file = HavenConfigFile {
        llm: LlmFileConfig {
            model: Some(model),
            ..existing.llm
        },
        emotion: EmotionFileConfig {
            enabled: Some(enable_emotion),
            ..existing.emotion
        },
        voice,
        timeouts: existing.timeouts,
        server: existing.server,
        persona: existing.persona,
        api_keys,
    };

    write_config(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());
    println!(
        "\nSetup complete! Run `haven` to open the chat page or `haven chat` for the terminal."
    );

    Ok(())
}

/// Ask for an API key, keeping the current one on blank input
fn ask_key(
    service: &str,
    env_hint: &str,
    current: Option<String>,
) -> anyhow::Result<Option<String>> {
    let prompt = match current.as_deref().map(mask) {
        Some(m) => format!("{service} API key (current: {m}, leave blank to keep)"),
        None => format!("{service} API key ({env_hint})"),
    };

    let input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    Ok(if input.is_empty() {
        current
    } else {
        Some(input.to_string())
    })
}

/// Show only the ends of a secret
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

fn default_index(options: &[&str], current: Option<&str>) -> usize {
    current
        .and_then(|c| options.iter().position(|o| o.eq_ignore_ascii_case(c.trim())))
        .unwrap_or(0)
}

/// Serialize and write the config file
fn write_config(path: &Path, config: &HavenConfigFile) -> anyhow::Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, serialize_config(config)?)?;
    Ok(())
}

fn serialize_config(config: &HavenConfigFile) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
