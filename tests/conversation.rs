//! Transcript and prompt composition integration tests

use haven::emotion::rank_top;
use haven::prompt::{EMOTION_PREFIX, format_emotions};
use haven::{ConversationStore, EmotionScore, Persona, Speaker, compose_prompt};

fn scores(pairs: &[(&str, f64)]) -> Vec<EmotionScore> {
    pairs
        .iter()
        .map(|(label, confidence)| EmotionScore::new(*label, *confidence))
        .collect()
}

#[test]
fn test_store_keeps_append_order() {
    let mut store = ConversationStore::new();
    assert!(store.is_empty());

    store.append(Speaker::User, "hello");
    store.append(Speaker::Bot, "Hi. How are you feeling?");
    store.append(Speaker::User, "tired");

    let all = store.all();
    assert_eq!(store.len(), 3);
    assert_eq!(all[0].text(), "hello");
    assert_eq!(all[1].speaker(), Speaker::Bot);
    assert_eq!(all[2].to_string(), "You: tired");
}

#[test]
fn test_six_label_output_keeps_top_two() {
    let all = scores(&[
        ("sadness", 0.1),
        ("joy", 0.9),
        ("love", 0.4),
        ("anger", 0.7),
        ("fear", 0.2),
        ("surprise", 0.05),
    ]);

    let top = rank_top(all, 2);

    assert_eq!(top, scores(&[("joy", 0.9), ("anger", 0.7)]));
    assert_eq!(
        format_emotions(&top).as_deref(),
        Some("Detected emotions: joy (0.90), anger (0.70)")
    );
}

#[test]
fn test_confidence_uses_two_decimals() {
    let line = format_emotions(&scores(&[("fear", 0.956)])).unwrap();
    assert_eq!(line, "Detected emotions: fear (0.96)");
}

#[test]
fn test_prompt_starts_with_persona_and_ends_with_annotation() {
    let persona = Persona::default();
    let mut store = ConversationStore::new();
    store.append(Speaker::User, "I can't focus");
    store.append(Speaker::Bot, "What has been on your mind?");

    let prompt = compose_prompt(
        persona.instruction(),
        store.all(),
        "work, mostly",
        &scores(&[("sadness", 0.61), ("fear", 0.3)]),
    );

    assert!(prompt.starts_with(persona.instruction()));
    let lines: Vec<&str> = prompt.lines().rev().take(4).collect();
    assert_eq!(lines[0], "Detected emotions: sadness (0.61), fear (0.30)");
    assert_eq!(lines[1], "User: work, mostly");
    assert_eq!(lines[2], "Bot: What has been on your mind?");
    assert_eq!(lines[3], "You: I can't focus");
}

#[test]
fn test_prompt_without_emotions_has_no_annotation() {
    let prompt = compose_prompt("PERSONA", &[], "hello", &[]);
    assert_eq!(prompt, "PERSONA\nUser: hello");
    assert!(!prompt.contains(EMOTION_PREFIX));
}
