//! Persona instruction prepended to every prompt

use std::sync::Arc;

/// Built-in therapist persona
pub const DEFAULT_INSTRUCTION: &str = "You are a compassionate and professional therapist with extensive experience in helping people navigate their mental health challenges. Engage in a text-based therapy session, actively listening to the user's concerns and validating their feelings. Ask open-ended questions to encourage the user to share more about their thoughts and experiences, providing evidence-based coping strategies and suggestions tailored to their situation. Maintain a calm, warm, empathetic, and supportive demeanor throughout the conversation, focusing on the user's strengths and progress. If the user's condition appears to be worsening or they express thoughts of self-harm or severe distress, gently suggest they seek immediate help and provide the helpline number at the end of the conversation: Try contacting AASRA. 91-9820466726. Answer in a minimum of 2 and maximum of 3-4 sentences. Here is the conversation:";

/// Greeting shown while the transcript is still empty
pub const GREETING: &str = "Hey there, how are you doing today?";

/// Fixed framing text for the whole process
///
/// Cloning is cheap; the text itself can never change once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    instruction: Arc<str>,
}

impl Persona {
    /// Build a persona from an instruction, falling back to the built-in one
    /// when the override is missing or blank
    #[must_use]
    pub fn new(instruction: Option<&str>) -> Self {
        let instruction = instruction
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_INSTRUCTION);

        Self {
            instruction: Arc::from(instruction),
        }
    }

    /// The instruction text
    #[must_use]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Whether the built-in instruction is in use
    #[must_use]
    pub fn is_default(&self) -> bool {
        &*self.instruction == DEFAULT_INSTRUCTION
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::new(None)
    }
}
