use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;

use haven::api::{ApiServer, ApiState};
use haven::controller::InteractionController;
use haven::voice::{
    AudioPlayback, Microphone, PLAYBACK_SAMPLE_RATE, SpeakerOutput, SpeechOutput, TextToSpeech,
    calculate_energy,
};
use haven::Config;

/// Haven - emotion-aware voice and text chat
#[derive(Parser)]
#[command(name = "haven", version, about)]
struct Cli {
    /// Port for the chat page
    #[arg(long, env = "HAVEN_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable voice features (for machines without audio hardware)
    #[arg(long, env = "HAVEN_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Serve the chat page (default)
    Serve,
    /// Chat in the terminal
    Chat,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hey there, how are you doing today?")]
        text: String,
    },
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,haven=info",
        1 => "info,haven=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Command::Serve);

    match &command {
        Command::Setup => return haven::setup::run_setup(),
        Command::TestMic { duration } => return test_mic(*duration).await,
        Command::TestSpeaker => return test_speaker().await,
        Command::TestTts { text } => return test_tts(text).await,
        Command::Serve | Command::Chat => {}
    }

    let mut config = Config::load_with_options(cli.disable_voice);
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!(
        model = %config.llm.model,
        port = config.server.port,
        voice = config.voice.enabled,
        "starting haven"
    );

    // Missing or rejected credentials end here
    let controller = InteractionController::from_config(&config).await?;

    if matches!(command, Command::Chat) {
        let mut controller = controller;
        haven::repl::run(&mut controller).await?;
        controller.shutdown();
        return Ok(());
    }

    let server = ApiServer::new(ApiState::new(controller), config.server.port)
        .bind(config.server.bind)
        .static_dir(config.server.static_dir.clone());
    let state = server.state();
    server.run().await?;

    // Tear down the session once no handler holds it
    if let Ok(state) = Arc::try_unwrap(state) {
        if let Ok(controller) = Arc::try_unwrap(state.controller) {
            controller.into_inner().shutdown();
        }
    }

    Ok(())
}

async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut mic = Microphone::open()?;
    mic.start()?;

    let sample_rate = mic.sample_rate();
    println!("Sample rate: {sample_rate} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = mic.drain();
        let energy = calculate_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    mic.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let frequency = 440.0_f32;
    let num_samples = PLAYBACK_SAMPLE_RATE as usize * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {PLAYBACK_SAMPLE_RATE} Hz...", samples.len());

    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play(samples)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");

    Ok(())
}

async fn test_tts(text: &str) -> anyhow::Result<()> {
    let config = Config::load();
    let voice = &config.voice;

    let key = config
        .api_keys
        .for_tts(voice.tts_provider)
        .map(|k| SecretString::from(k.expose_secret().to_string()))
        .ok_or_else(|| anyhow::anyhow!("no API key configured for {:?} TTS", voice.tts_provider))?;

    let tts = TextToSpeech::new(
        voice.tts_provider,
        key,
        voice.tts_model.clone(),
        voice.tts_voices.clone(),
        voice.tts_speed,
    )?;

    println!(
        "Speaking with voice {} ({})...",
        voice.playback_voice,
        tts.resolve_voice(Some(voice.playback_voice))
    );

    let output = SpeakerOutput::new(Arc::new(tts), config.timeouts.synthesis);
    output.speak(text, Some(voice.playback_voice)).await?;

    println!("Done.");
    Ok(())
}
