//! Voice processing module
//!
//! Microphone capture with end-of-phrase detection, remote STT and TTS, and
//! speaker playback. The controller only sees [`SpeechInput`] and
//! [`SpeechOutput`].

mod capture;
mod input;
mod output;
mod playback;
mod stt;
mod tts;
mod vad;

pub use capture::{Microphone, SAMPLE_RATE, record_phrase, samples_to_wav};
pub use input::{CaptureOutcome, MicrophoneInput, SpeechInput};
pub use output::{SpeakerOutput, SpeechOutput};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3, resample};
pub use stt::{SpeechToText, SttProvider};
pub use tts::{TextToSpeech, TtsProvider};
pub use vad::{DetectorState, UtteranceDetector, calculate_energy};
