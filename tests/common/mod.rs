//! Shared test utilities: in-process stubs for the remote endpoints

use axum::Router;
use tokio::net::TcpListener;

use talkie::config::{Config, ModelProfile, ModelTable, VoiceConfig};

/// Bind a stub endpoint router on an ephemeral port, returning its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind stub listener");
    let addr = listener.local_addr().expect("stub has no local addr");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("stub server failed");
    });

    format!("http://{addr}")
}

/// Model table with the standard/multilingual profiles on `/primary` and the
/// advanced (escalation) profile on `/advanced` under `base`
#[must_use]
pub fn stub_models(base: &str) -> ModelTable {
    ModelTable {
        standard: ModelProfile {
            endpoint: format!("{base}/primary"),
            max_length: 150,
            temperature: 0.7,
        },
        advanced: ModelProfile {
            endpoint: format!("{base}/advanced"),
            max_length: 200,
            temperature: 0.8,
        },
        multilingual: ModelProfile {
            endpoint: format!("{base}/primary"),
            max_length: 180,
            temperature: 0.75,
        },
    }
}

/// Config wired entirely to stub endpoints under `base`: ASR on `/asr`,
/// TTS on `/tts`, generation per [`stub_models`]
#[must_use]
pub fn stub_config(base: &str) -> Config {
    Config {
        api_key: Some("test-token".to_string()),
        stt_endpoint: format!("{base}/asr"),
        tts_endpoint: format!("{base}/tts"),
        models: stub_models(base),
        voice: VoiceConfig {
            record_secs: 0.1,
            sample_rate: 16_000,
        },
        port: 0,
    }
}
