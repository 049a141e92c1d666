//! Outbound prompt composition
//!
//! The layout is fixed: persona, one `<speaker>: <text>` line per transcript
//! entry, the new `User:` line, then the detected-emotion line. The remote
//! model was tuned against this framing, so field order and the two-decimal
//! confidence format are part of the contract.

use std::fmt::Write as _;

use crate::conversation::Utterance;
use crate::emotion::EmotionScore;

/// Prefix of the annotation line
pub const EMOTION_PREFIX: &str = "Detected emotions: ";

/// Build the message sent to the dialogue service
///
/// Pure function of its inputs. With no emotions the annotation line is
/// omitted entirely rather than sent empty.
#[must_use]
pub fn compose_prompt(
    persona: &str,
    history: &[Utterance],
    new_user_text: &str,
    emotions: &[EmotionScore],
) -> String {
    let estimate = persona.len() + new_user_text.len() + 64 * (history.len() + 1);
    let mut out = String::with_capacity(estimate);
    out.push_str(persona);

    for utterance in history {
        let _ = write!(out, "\n{}: {}", utterance.speaker().label(), utterance.text());
    }

    let _ = write!(out, "\nUser: {new_user_text}");

    if let Some(line) = format_emotions(emotions) {
        out.push('\n');
        out.push_str(&line);
    }

    out
}

/// Render the annotation line, e.g. `Detected emotions: fear (0.91), sadness (0.05)`
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn format_emotions(emotions: &[EmotionScore]) -> Option<String> {
    if emotions.is_empty() {
        return None;
    }

    let rendered: Vec<String> = emotions
        .iter()
        .map(|e| format!("{} ({:.2})", e.label, e.confidence))
        .collect();

    Some(format!("{EMOTION_PREFIX}{}", rendered.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Speaker, Utterance};

    fn score(label: &str, confidence: f64) -> EmotionScore {
        EmotionScore::new(label, confidence)
    }

    #[test]
    fn layout_with_history_and_emotions() {
        let history = vec![
            Utterance::new(Speaker::User, "I can't sleep"),
            Utterance::new(Speaker::Bot, "That sounds hard."),
        ];
        let emotions = vec![score("sadness", 0.8123), score("fear", 0.1)];

        let prompt = compose_prompt("PERSONA", &history, "It keeps happening", &emotions);

        assert_eq!(
            prompt,
            "PERSONA\nYou: I can't sleep\nBot: That sounds hard.\nUser: It keeps happening\nDetected emotions: sadness (0.81), fear (0.10)"
        );
    }

    #[test]
    fn empty_history_has_no_blank_line() {
        let prompt = compose_prompt("PERSONA", &[], "hello", &[score("joy", 0.5)]);
        assert_eq!(prompt, "PERSONA\nUser: hello\nDetected emotions: joy (0.50)");
    }

    #[test]
    fn no_emotions_omits_annotation() {
        let prompt = compose_prompt("PERSONA", &[], "hello", &[]);
        assert_eq!(prompt, "PERSONA\nUser: hello");
        assert!(!prompt.contains(EMOTION_PREFIX));
    }

    #[test]
    fn confidences_round_to_two_decimals() {
        let scores = [score("anger", 0.956), score("joy", 0.004), score("love", 1.0)];
        let line = format_emotions(&scores).unwrap();
        assert_eq!(line, "Detected emotions: anger (0.96), joy (0.00), love (1.00)");
    }

    #[test]
    fn composition_is_deterministic() {
        let history = vec![Utterance::new(Speaker::User, "a")];
        let emotions = vec![score("joy", 0.3)];
        let first = compose_prompt("P", &history, "b", &emotions);
        let second = compose_prompt("P", &history, "b", &emotions);
        assert_eq!(first, second);
    }
}
