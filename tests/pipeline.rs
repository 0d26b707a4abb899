//! End-to-end turn scenarios through the session orchestrator
//!
//! The remote ASR/generation/TTS endpoints are in-process stubs; TTS answers
//! with an error in most scenarios so playback is skipped and no audio
//! hardware is needed.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use talkie::config::ModelChoice;
use talkie::voice::{AudioBuffer, SAMPLE_RATE};
use talkie::{Error, Role, Session, Status, TurnOutcome};

mod common;

const API_ERROR_REPLY: &str =
    "I'm having trouble thinking right now. Let's talk about something else.";

/// A half-amplitude square-ish buffer, comfortably above the silence peak
fn audible_buffer() -> AudioBuffer {
    AudioBuffer {
        samples: vec![16_000; 1_600],
        sample_rate: SAMPLE_RATE,
    }
}

/// Stub where ASR hears `transcript`, generation replies `reply`, and TTS
/// fails (playback skipped)
fn stub_router(transcript: &str, reply: &str) -> Router {
    let transcript = transcript.to_string();
    let reply = reply.to_string();

    Router::new()
        .route(
            "/asr",
            post(move || {
                let transcript = transcript.clone();
                async move { Json(json!({"text": transcript})) }
            }),
        )
        .route(
            "/primary",
            post(move || {
                let reply = reply.clone();
                async move { Json(json!([{"generated_text": reply}])) }
            }),
        )
        .route("/advanced", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/tts", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
}

#[tokio::test]
async fn scenario_a_clear_speech_appends_both_turns() {
    let base =
        common::spawn_stub(stub_router("hello", "Hello there! How can I help you today?")).await;
    let session = Session::new(common::stub_config(&base)).unwrap();

    let outcome = session
        .audio_turn(audible_buffer(), ModelChoice::Standard)
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Replied { user, assistant } => {
            assert_eq!(user, "hello");
            assert!(!assistant.is_empty());
        }
        TurnOutcome::NothingHeard => panic!("expected a reply"),
    }

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[0].content, "hello");
    assert_eq!(transcript[1].role, Role::Assistant);
    assert!(!transcript[1].content.is_empty());

    assert_eq!(session.status(), Status::Idle);
    assert!(!session.is_speaking());
}

#[tokio::test]
async fn scenario_b_empty_transcription_leaves_transcript_unchanged() {
    let base = common::spawn_stub(stub_router("", "never used")).await;
    let session = Session::new(common::stub_config(&base)).unwrap();

    let outcome = session
        .audio_turn(audible_buffer(), ModelChoice::Standard)
        .await
        .unwrap();

    assert_eq!(outcome, TurnOutcome::NothingHeard);
    assert!(session.transcript().is_empty());
    assert_eq!(session.status(), Status::Idle);
}

#[tokio::test]
async fn scenario_c_generation_error_becomes_apology_turn() {
    let router = Router::new()
        .route("/asr", post(|| async { Json(json!({"text": "hello"})) }))
        .route(
            "/primary",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route("/advanced", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/tts", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let base = common::spawn_stub(router).await;
    let session = Session::new(common::stub_config(&base)).unwrap();

    let outcome = session
        .audio_turn(audible_buffer(), ModelChoice::Standard)
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Replied { assistant, .. } => assert_eq!(assistant, API_ERROR_REPLY),
        TurnOutcome::NothingHeard => panic!("expected an apology reply"),
    }

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].content, API_ERROR_REPLY);
}

#[tokio::test]
async fn scenario_d_escalated_reply_lands_in_transcript() {
    let router = Router::new()
        .route("/asr", post(|| async { Json(json!({"text": "why?"})) }))
        .route(
            "/primary",
            post(|| async { Json(json!([{"generated_text": "Hi."}])) }),
        )
        .route(
            "/advanced",
            post(|| async {
                Json(json!([{"generated_text": "A forty character detailed explanation!!"}]))
            }),
        )
        .route("/tts", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let base = common::spawn_stub(router).await;
    let session = Session::new(common::stub_config(&base)).unwrap();

    let outcome = session
        .audio_turn(audible_buffer(), ModelChoice::Standard)
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Replied { assistant, .. } => {
            assert_eq!(assistant, "A forty character detailed explanation!!");
        }
        TurnOutcome::NothingHeard => panic!("expected a reply"),
    }
}

#[tokio::test]
async fn text_turn_skips_capture_and_transcription() {
    let base = common::spawn_stub(stub_router(
        "never used",
        "Typed conversations work just as well.",
    ))
    .await;
    let session = Session::new(common::stub_config(&base)).unwrap();

    let outcome = session
        .text_turn("hi there", ModelChoice::Standard)
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Replied { user, assistant } => {
            assert_eq!(user, "hi there");
            assert_eq!(assistant, "Typed conversations work just as well.");
        }
        TurnOutcome::NothingHeard => panic!("expected a reply"),
    }
}

#[tokio::test]
async fn blank_text_turn_appends_nothing() {
    let base = common::spawn_stub(stub_router("never used", "never used")).await;
    let session = Session::new(common::stub_config(&base)).unwrap();

    let outcome = session.text_turn("   ", ModelChoice::Standard).await.unwrap();
    assert_eq!(outcome, TurnOutcome::NothingHeard);
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn concurrent_turn_is_rejected() {
    let router = Router::new()
        .route(
            "/primary",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(400)).await;
                Json(json!([{"generated_text": "A slow but perfectly valid reply."}]))
            }),
        )
        .route("/advanced", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/tts", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let base = common::spawn_stub(router).await;
    let session = Arc::new(Session::new(common::stub_config(&base)).unwrap());

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.text_turn("slow question", ModelChoice::Standard).await })
    };

    // Let the first turn take the lock, then try to start another
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = session.text_turn("impatient question", ModelChoice::Standard).await;
    assert!(matches!(second, Err(Error::TurnInProgress)));

    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, TurnOutcome::Replied { .. }));

    // Only the first turn reached the transcript
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test]
async fn transcript_order_is_conversation_order() {
    let base = common::spawn_stub(stub_router("never used", "Reply number noted.")).await;
    let session = Session::new(common::stub_config(&base)).unwrap();

    session.text_turn("one", ModelChoice::Standard).await.unwrap();
    session.text_turn("two", ModelChoice::Standard).await.unwrap();

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[0].content, "one");
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[2].content, "two");
    assert_eq!(transcript[2].role, Role::User);
    assert_eq!(transcript[1].role, Role::Assistant);
    assert_eq!(transcript[3].role, Role::Assistant);
}

#[tokio::test]
async fn successful_synthesis_still_completes_without_audio_hardware() {
    // TTS returns a real WAV payload; playback itself may fail on a headless
    // machine, but the turn must still complete and clear the speaking flag.
    let wav = {
        let buffer = AudioBuffer {
            samples: vec![0; 160],
            sample_rate: SAMPLE_RATE,
        };
        let file = talkie::voice::persist(&buffer).unwrap();
        file.read_bytes().unwrap()
    };

    let router = Router::new()
        .route(
            "/primary",
            post(|| async { Json(json!([{"generated_text": "A reply that will be spoken aloud."}])) }),
        )
        .route("/advanced", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/tts",
            post(move || {
                let wav = wav.clone();
                async move { (StatusCode::OK, wav) }
            }),
        );
    let base = common::spawn_stub(router).await;
    let session = Session::new(common::stub_config(&base)).unwrap();

    let outcome = session
        .text_turn("say something", ModelChoice::Standard)
        .await
        .unwrap();

    assert!(matches!(outcome, TurnOutcome::Replied { .. }));
    assert!(!session.is_speaking());
    assert_eq!(session.status(), Status::Idle);
}
