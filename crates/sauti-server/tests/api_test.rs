// Integration tests for the HTTP API against a mock engine backend.

use std::net::SocketAddr;
use std::sync::Arc;

use sauti_core::engine::{
    CodecTokenizer, DeviceMemoryStats, DeviceSpec, EngineBackend, SpeechModel, Synthesis,
    SynthesisRequest,
};
use sauti_core::error::Result as CoreResult;
use sauti_core::{EngineConfig, SpeechService};
use sauti_server::api::create_router;
use sauti_server::state::AppState;

struct MockModel;

impl SpeechModel for MockModel {
    fn generate(&self, _request: &SynthesisRequest) -> CoreResult<Synthesis> {
        Ok(Synthesis {
            samples: vec![0.05; 24000],
            sample_rate: 24000,
        })
    }
}

struct MockTokenizer;

impl CodecTokenizer for MockTokenizer {
    fn encode(&self, text: &str) -> CoreResult<Vec<u32>> {
        Ok(text.bytes().map(u32::from).collect())
    }

    fn decode(&self, tokens: &[u32]) -> CoreResult<String> {
        Ok(tokens.iter().map(|t| (*t as u8) as char).collect())
    }
}

struct MockBackend;

impl EngineBackend for MockBackend {
    fn load_model(&self, _source: &str, _device: &DeviceSpec) -> CoreResult<Box<dyn SpeechModel>> {
        Ok(Box::new(MockModel))
    }

    fn load_tokenizer(&self, _device: &DeviceSpec) -> CoreResult<Box<dyn CodecTokenizer>> {
        Ok(Box::new(MockTokenizer))
    }

    fn memory_stats(&self, _device: &DeviceSpec) -> Option<DeviceMemoryStats> {
        None
    }

    fn release_cached(&self, _device: &DeviceSpec) {}
}

async fn spawn_server() -> SocketAddr {
    let mut config = EngineConfig::default();
    config.device = "cpu".to_string();

    let service = SpeechService::new(config, Arc::new(MockBackend)).unwrap();
    let state = AppState::new(service);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn health_check_reports_ok() {
    let addr = spawn_server().await;
    let body: serde_json::Value = reqwest::get(format!("http://{addr}/api/v1/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "sauti-server");
}

#[tokio::test]
async fn status_tracks_generation_and_offload() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    // Empty at startup.
    let status: serde_json::Value = client
        .get(format!("http://{addr}/api/v1/engine/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["loaded"], false);
    assert!(status["variant"].is_null());

    // Generation loads the model.
    let response = client
        .post(format!("http://{addr}/api/v1/tts/custom-voice"))
        .json(&serde_json::json!({ "text": "Hello from the test" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "audio/wav"
    );
    assert!(response.headers().contains_key("x-rtf"));
    let wav = response.bytes().await.unwrap();
    assert_eq!(&wav[0..4], b"RIFF");

    let status: serde_json::Value = client
        .get(format!("http://{addr}/api/v1/engine/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["loaded"], true);
    assert_eq!(status["variant"], "custom_voice");
    assert!(status["idle_seconds"].is_number());

    // Offload empties the slot.
    let response = client
        .post(format!("http://{addr}/api/v1/engine/offload"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let status: serde_json::Value = client
        .get(format!("http://{addr}/api/v1/engine/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["loaded"], false);
    assert!(status["idle_seconds"].is_null());
}

#[tokio::test]
async fn voice_design_requires_description() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/v1/tts/voice-design"))
        .json(&serde_json::json!({ "text": "Hello", "instruct": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("http://{addr}/api/v1/tts/voice-design"))
        .json(&serde_json::json!({
            "text": "Hello",
            "instruct": "a warm, slow narrator voice"
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn unknown_speaker_is_a_client_error() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/v1/tts/custom-voice"))
        .json(&serde_json::json!({ "text": "Hello", "speaker": "Nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn catalog_endpoints_list_presets() {
    let addr = spawn_server().await;

    let speakers: serde_json::Value = reqwest::get(format!("http://{addr}/api/v1/speakers"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names = speakers["speakers"].as_array().unwrap();
    assert!(names.iter().any(|s| s == "Vivian"));
    assert_eq!(names.len(), 9);

    let languages: serde_json::Value = reqwest::get(format!("http://{addr}/api/v1/languages"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names = languages["languages"].as_array().unwrap();
    assert!(names.iter().any(|s| s == "Auto"));
    assert_eq!(names.len(), 11);
}
