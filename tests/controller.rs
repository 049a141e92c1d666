//! Interaction controller integration tests

use std::sync::Arc;

use haven::controller::{NO_MATCH_NOTICE, SERVICE_UNAVAILABLE_NOTICE, VOICE_DISABLED_NOTICE};
use haven::dialogue::FALLBACK_REPLY;
use haven::emotion::{EmotionAnnotator, EmotionScore};
use haven::persona::{DEFAULT_INSTRUCTION, GREETING};
use haven::voice::CaptureOutcome;
use haven::config::file::HavenConfigFile;
use haven::{
    Config, Error, InteractionController, Session, Speaker, TurnOrigin, TurnOutcome, TurnState,
};

mod common;
use common::{
    DEFAULT_REPLY, FailingClassifier, RecordingOutput, ScriptedBackend, ScriptedInput, annotator,
    controller,
};

#[tokio::test]
async fn first_typed_turn_records_user_then_bot() {
    let backend =
        Arc::new(ScriptedBackend::new().reply("I'm sorry to hear that. What's worrying you?"));
    let mut controller = controller(backend, EmotionAnnotator::disabled());

    let outcome = controller.submit_text("I feel anxious today").await;

    assert!(outcome.is_completed());
    let history = controller.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].speaker(), Speaker::User);
    assert_eq!(history[0].text(), "I feel anxious today");
    assert_eq!(history[1].speaker(), Speaker::Bot);
    assert!(!history[1].text().is_empty());
    assert_eq!(controller.state(), TurnState::Idle);
}

#[tokio::test]
async fn nth_turn_occupies_positions_2n_minus_1_and_2n() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("reply one")
            .reply("reply two")
            .reply("reply three"),
    );
    let mut controller = controller(backend, EmotionAnnotator::disabled());

    for text in ["one", "two", "three"] {
        controller.submit_text(text).await;
    }

    let history = controller.history();
    assert_eq!(history.len(), 6);
    for (n, (user, bot)) in [("one", "reply one"), ("two", "reply two"), ("three", "reply three")]
        .iter()
        .enumerate()
    {
        let n = n + 1;
        assert_eq!(history[2 * n - 2].speaker(), Speaker::User);
        assert_eq!(history[2 * n - 2].text(), *user);
        assert_eq!(history[2 * n - 1].speaker(), Speaker::Bot);
        assert_eq!(history[2 * n - 1].text(), *bot);
    }
    assert_eq!(controller.turns(), 3);
}

#[tokio::test]
async fn prompt_carries_persona_history_and_emotions() {
    let backend = Arc::new(ScriptedBackend::new().reply("first reply").reply("second reply"));
    let prompts = backend.prompts();
    let scores = vec![
        EmotionScore::new("joy", 0.1),
        EmotionScore::new("fear", 0.956),
        EmotionScore::new("sadness", 0.4),
    ];
    let mut controller = controller(backend, annotator(scores));

    controller.submit_text("hello").await;
    controller.submit_text("I can't sleep").await;

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);

    let expected = format!(
        "{DEFAULT_INSTRUCTION}\nYou: hello\nBot: first reply\nUser: I can't sleep\nDetected emotions: fear (0.96), sadness (0.40)"
    );
    assert_eq!(prompts[1], expected);
}

#[tokio::test]
async fn empty_reply_becomes_fallback_and_is_recorded() {
    let backend = Arc::new(ScriptedBackend::new().empty());
    let mut controller = controller(backend, EmotionAnnotator::disabled());

    let outcome = controller.submit_text("hello?").await;

    match outcome {
        TurnOutcome::Completed { reply, .. } => assert_eq!(reply, FALLBACK_REPLY),
        other => panic!("expected completed turn, got {other:?}"),
    }
    assert_eq!(controller.history()[1].text(), FALLBACK_REPLY);
}

#[tokio::test]
async fn persistent_service_failure_becomes_fallback() {
    let unavailable = || Error::ServiceUnavailable {
        service: "gemini",
        message: "overloaded".to_string(),
        retry_after: None,
    };
    let backend = Arc::new(
        ScriptedBackend::new()
            .fail(unavailable())
            .fail(unavailable())
            .fail(unavailable()),
    );
    let prompts = backend.prompts();
    let mut controller = controller(backend, EmotionAnnotator::disabled());

    let outcome = controller.submit_text("are you there").await;

    assert!(outcome.is_completed());
    assert_eq!(controller.history()[1].text(), FALLBACK_REPLY);
    // One attempt plus two retries
    assert_eq!(prompts.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .fail(Error::ServiceUnavailable {
                service: "gemini",
                message: "rate limited".to_string(),
                retry_after: None,
            })
            .reply("recovered"),
    );
    let mut controller = controller(backend, EmotionAnnotator::disabled());

    controller.submit_text("hi").await;
    assert_eq!(controller.history()[1].text(), "recovered");
}

#[tokio::test]
async fn classifier_failure_means_no_annotation() {
    let backend = Arc::new(ScriptedBackend::new());
    let prompts = backend.prompts();
    let annotator = EmotionAnnotator::new(
        Arc::new(FailingClassifier),
        2,
        std::time::Duration::from_secs(1),
    );
    let mut controller = controller(backend, annotator);

    let outcome = controller.submit_text("hello").await;

    match outcome {
        TurnOutcome::Completed { emotions, .. } => assert!(emotions.is_empty()),
        other => panic!("expected completed turn, got {other:?}"),
    }
    assert!(!prompts.lock().unwrap()[0].contains("Detected emotions"));
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let backend = Arc::new(ScriptedBackend::new());
    let prompts = backend.prompts();
    let mut controller = controller(backend, EmotionAnnotator::disabled());

    assert_eq!(controller.submit_text("   ").await, TurnOutcome::Ignored);
    assert!(controller.history().is_empty());
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn voice_no_match_leaves_store_unchanged() {
    let backend = Arc::new(ScriptedBackend::new());
    let prompts = backend.prompts();
    let output = Arc::new(RecordingOutput::default());
    let mut controller = controller(backend, EmotionAnnotator::disabled()).with_voice(
        Arc::new(ScriptedInput::new(vec![CaptureOutcome::NoMatch])),
        output.clone(),
        Some(1),
    );

    let outcome = controller.speak().await;

    assert_eq!(outcome.notice(), Some(NO_MATCH_NOTICE));
    assert!(controller.history().is_empty());
    assert!(prompts.lock().unwrap().is_empty());
    assert!(output.spoken().is_empty());
    assert_eq!(controller.state(), TurnState::Idle);
}

#[tokio::test]
async fn voice_service_failure_shows_network_notice() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut controller = controller(backend, EmotionAnnotator::disabled()).with_voice(
        Arc::new(ScriptedInput::new(vec![CaptureOutcome::ServiceUnavailable(
            "connection refused".to_string(),
        )])),
        Arc::new(RecordingOutput::default()),
        Some(1),
    );

    let outcome = controller.speak().await;

    assert_eq!(outcome.notice(), Some(SERVICE_UNAVAILABLE_NOTICE));
    assert!(controller.history().is_empty());
}

#[tokio::test]
async fn voice_turn_speaks_reply_with_fixed_voice() {
    let backend = Arc::new(ScriptedBackend::new().reply("Let's take a breath together."));
    let output = Arc::new(RecordingOutput::default());
    let mut controller = controller(backend, EmotionAnnotator::disabled()).with_voice(
        Arc::new(ScriptedInput::new(vec![CaptureOutcome::Recognized(
            "I had a rough day".to_string(),
        )])),
        output.clone(),
        Some(1),
    );

    let outcome = controller.speak().await;

    match outcome {
        TurnOutcome::Completed { origin, spoken, user, .. } => {
            assert_eq!(origin, TurnOrigin::Voice);
            assert!(spoken);
            assert_eq!(user, "I had a rough day");
        }
        other => panic!("expected completed turn, got {other:?}"),
    }
    assert_eq!(
        output.spoken(),
        vec![("Let's take a breath together.".to_string(), Some(1))]
    );
    assert_eq!(controller.history().len(), 2);
}

#[tokio::test]
async fn typed_turn_is_never_spoken() {
    let backend = Arc::new(ScriptedBackend::new());
    let output = Arc::new(RecordingOutput::default());
    let mut controller = controller(backend, EmotionAnnotator::disabled()).with_voice(
        Arc::new(ScriptedInput::new(vec![])),
        output.clone(),
        Some(1),
    );

    let outcome = controller.submit_text("hello").await;

    match outcome {
        TurnOutcome::Completed { spoken, reply, .. } => {
            assert!(!spoken);
            assert_eq!(reply, DEFAULT_REPLY);
        }
        other => panic!("expected completed turn, got {other:?}"),
    }
    assert!(output.spoken().is_empty());
}

#[tokio::test]
async fn playback_failure_keeps_the_turn() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut controller = controller(backend, EmotionAnnotator::disabled()).with_voice(
        Arc::new(ScriptedInput::new(vec![CaptureOutcome::Recognized("hi".to_string())])),
        Arc::new(RecordingOutput::failing()),
        Some(1),
    );

    let outcome = controller.speak().await;

    match outcome {
        TurnOutcome::Completed { spoken, .. } => assert!(!spoken),
        other => panic!("expected completed turn, got {other:?}"),
    }
    assert_eq!(controller.history().len(), 2);
}

#[tokio::test]
async fn speak_without_voice_is_a_notice() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut controller = controller(backend, EmotionAnnotator::disabled());

    let outcome = controller.speak().await;
    assert_eq!(outcome.notice(), Some(VOICE_DISABLED_NOTICE));
    assert!(controller.history().is_empty());
}

#[tokio::test]
async fn greeting_only_while_transcript_empty() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut controller = controller(backend, EmotionAnnotator::disabled());

    assert_eq!(controller.greeting(), Some(GREETING));
    controller.submit_text("hi").await;
    assert_eq!(controller.greeting(), None);
}

#[tokio::test]
async fn missing_google_key_is_fatal() {
    let config = Config::from_sources(HavenConfigFile::default(), |_| None, true);

    let session = Session::from_config(&config).await;
    assert!(matches!(session, Err(Error::Credential(_))));

    let controller = InteractionController::from_config(&config).await;
    assert!(matches!(controller, Err(Error::Credential(_))));
}
