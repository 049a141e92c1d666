//! Microphone capture and phrase recording

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use super::vad::{DetectorState, UtteranceDetector};
use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// How often the capture buffer is drained while listening
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The default input device, opened for 16kHz mono
pub struct Microphone {
    device: Device,
    config: StreamConfig,
    pending: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl Microphone {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns error if no input device supports 16kHz mono
    pub fn open() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no microphone found".to_string()))?;

        let rate = SampleRate(SAMPLE_RATE);
        let config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1 && (c.min_sample_rate()..=c.max_sample_rate()).contains(&rate)
            })
            .ok_or_else(|| Error::Audio("microphone cannot record 16kHz mono".to_string()))?
            .with_sample_rate(rate)
            .config();

        tracing::debug!(device = device.name().unwrap_or_default(), "microphone opened");

        Ok(Self {
            device,
            config,
            pending: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Begin filling the pending buffer
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built or started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let pending = Arc::clone(&self.pending);
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = pending.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| tracing::error!(error = %err, "microphone stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Close the input stream
    pub fn stop(&mut self) {
        self.stream = None;
    }

    /// Samples recorded since the last drain
    #[must_use]
    pub fn drain(&self) -> Vec<f32> {
        self.pending
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

/// Record one spoken phrase from the default microphone
///
/// Blocks the calling thread until the detector sees speech followed by a
/// pause, or `max_listen` elapses. Returns whatever speech was heard, which
/// is empty if nobody spoke.
///
/// # Errors
///
/// Returns error if the microphone cannot be opened
pub fn record_phrase(max_listen: Duration) -> Result<Vec<f32>> {
    let mut mic = Microphone::open()?;
    mic.start()?;
    tracing::info!(?max_listen, "listening");

    let speech = collect_phrase(
        || {
            std::thread::sleep(POLL_INTERVAL);
            mic.drain()
        },
        max_listen,
    );

    mic.stop();
    Ok(speech)
}

/// Feed chunks to a fresh detector until a phrase completes or time runs out
fn collect_phrase(mut next_chunk: impl FnMut() -> Vec<f32>, max_listen: Duration) -> Vec<f32> {
    let mut detector = UtteranceDetector::new();
    // No deadline if the limit runs past the clock's range
    let deadline = Instant::now().checked_add(max_listen);

    loop {
        let samples = next_chunk();
        if !samples.is_empty() && detector.process(&samples) == DetectorState::Complete {
            break;
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::debug!(state = ?detector.state(), "listen limit reached");
            break;
        }
    }

    detector.take_speech()
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
