//! Haven - emotion-aware voice and text chat
//!
//! A single-session conversational front-end. User text (typed, or spoken
//! and transcribed) is tagged with its detected emotions, combined with the
//! running transcript and a fixed persona, and sent to a remote chat model.
//! Replies are shown and, for spoken turns, read aloud.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Front-ends                        │
//! │        Web page (api)   │   Terminal (repl)          │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              InteractionController                   │
//! │  Session (transcript + dialogue) │ prompt composer   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Remote services                      │
//! │   Gemini  │  Hugging Face emotion  │  STT  │  TTS    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod bounded;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod dialogue;
pub mod emotion;
pub mod error;
pub mod persona;
pub mod prompt;
pub mod repl;
pub mod session;
pub mod setup;
pub mod voice;

pub use config::Config;
pub use controller::{InteractionController, TurnOrigin, TurnOutcome, TurnState};
pub use conversation::{ConversationStore, Speaker, Utterance};
pub use dialogue::{ChatBackend, DialogueClient};
pub use emotion::{EmotionAnnotator, EmotionClassifier, EmotionScore};
pub use error::{Error, Result};
pub use persona::Persona;
pub use prompt::compose_prompt;
pub use session::Session;
