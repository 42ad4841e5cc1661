//! TTS generation endpoints

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, Response},
    Json,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use sauti_core::audio::{decode_wav_bytes, AudioEncoder, AudioFormat};
use sauti_core::engine::{ReferenceAudio, SynthesisRequest};
use sauti_core::{GenerationResult, SynthesisParams, VoiceVariant};

/// Preset-speaker synthesis request
#[derive(Debug, Deserialize)]
pub struct CustomVoiceRequest {
    pub text: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_speaker")]
    pub speaker: String,

    /// Optional style instruction ("speak angrily", ...)
    #[serde(default)]
    pub instruct: String,

    /// Output format (wav, raw_f32, raw_i16)
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(flatten)]
    pub params: SynthesisParams,
}

/// Described-voice synthesis request
#[derive(Debug, Deserialize)]
pub struct VoiceDesignRequest {
    pub text: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Natural-language description of the voice to design
    pub instruct: String,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(flatten)]
    pub params: SynthesisParams,
}

fn default_language() -> String {
    "Auto".to_string()
}

fn default_speaker() -> String {
    "Vivian".to_string()
}

fn default_format() -> String {
    "wav".to_string()
}

/// Generate speech with a preset speaker
pub async fn custom_voice(
    State(state): State<AppState>,
    Json(req): Json<CustomVoiceRequest>,
) -> Result<Response<Body>, ApiError> {
    info!("Custom voice request: {} chars", req.text.len());

    let _permit = state.acquire_permit().await;
    let format = AudioFormat::parse(&req.format)?;

    let mut request = SynthesisRequest::new(req.text);
    request.language = Some(req.language);
    request.speaker = Some(req.speaker);
    request.instruct = non_empty(req.instruct);
    request.params = req.params;

    let result = generate_with_timeout(&state, VoiceVariant::CustomVoice, request).await?;
    audio_response(result, format).await
}

/// Generate speech for a voice described in natural language
pub async fn voice_design(
    State(state): State<AppState>,
    Json(req): Json<VoiceDesignRequest>,
) -> Result<Response<Body>, ApiError> {
    info!("Voice design request: {} chars", req.text.len());

    let _permit = state.acquire_permit().await;
    let format = AudioFormat::parse(&req.format)?;

    let mut request = SynthesisRequest::new(req.text);
    request.language = Some(req.language);
    request.instruct = non_empty(req.instruct);
    request.params = req.params;

    let result = generate_with_timeout(&state, VoiceVariant::VoiceDesign, request).await?;
    audio_response(result, format).await
}

/// Clone a voice from uploaded reference audio.
///
/// Multipart fields: `text` (required), `ref_audio` (WAV file, required),
/// `language`, `ref_text`, `x_vector_only`, `format`, `params` (JSON).
pub async fn voice_clone(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response<Body>, ApiError> {
    let _permit = state.acquire_permit().await;

    let mut text: Option<String> = None;
    let mut language = default_language();
    let mut ref_text: Option<String> = None;
    let mut x_vector_only = false;
    let mut format = default_format();
    let mut params = SynthesisParams::default();
    let mut ref_audio_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed reading multipart field: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "ref_audio" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| field_error(&name, &e.to_string()))?;
                ref_audio_bytes = Some(bytes.to_vec());
            }
            "text" => text = Some(field_text(field, &name).await?),
            "language" => language = field_text(field, &name).await?,
            "ref_text" => ref_text = non_empty(field_text(field, &name).await?),
            "x_vector_only" => {
                let value = field_text(field, &name).await?;
                x_vector_only = matches!(value.trim(), "true" | "1" | "yes");
            }
            "format" => format = field_text(field, &name).await?,
            "params" => {
                let value = field_text(field, &name).await?;
                params = serde_json::from_str(&value)
                    .map_err(|e| ApiError::bad_request(format!("Invalid params JSON: {e}")))?;
            }
            _ => {}
        }
    }

    let text = text.ok_or_else(|| ApiError::bad_request("Missing 'text' field"))?;
    let ref_audio_bytes =
        ref_audio_bytes.ok_or_else(|| ApiError::bad_request("Missing 'ref_audio' file"))?;
    info!("Voice clone request: {} chars", text.len());

    let format = AudioFormat::parse(&format)?;
    let (samples, sample_rate) = decode_wav_bytes(&ref_audio_bytes)?;

    let mut request = SynthesisRequest::new(text);
    request.language = Some(language);
    request.reference = Some(ReferenceAudio {
        samples,
        sample_rate,
        transcript: ref_text,
        x_vector_only,
    });
    request.params = params;

    let result = generate_with_timeout(&state, VoiceVariant::VoiceClone, request).await?;
    audio_response(result, format).await
}

async fn field_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| field_error(name, &e.to_string()))
}

fn field_error(name: &str, detail: &str) -> ApiError {
    ApiError::bad_request(format!("Failed reading multipart '{}' field: {}", name, detail))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

async fn generate_with_timeout(
    state: &AppState,
    variant: VoiceVariant,
    request: SynthesisRequest,
) -> Result<GenerationResult, ApiError> {
    let timeout = Duration::from_secs(state.request_timeout_secs);
    tokio::time::timeout(timeout, state.service.generate(variant, request))
        .await
        .map_err(|_| ApiError::internal("Request timeout"))?
        .map_err(ApiError::from)
}

/// Encode the generated audio and attach timing headers.
async fn audio_response(
    result: GenerationResult,
    format: AudioFormat,
) -> Result<Response<Body>, ApiError> {
    let encoder = AudioEncoder::new(result.sample_rate, 1);
    let samples = result.samples.clone();

    // Spawn blocking for audio encoding (CPU intensive)
    let audio_bytes = tokio::task::spawn_blocking(move || encoder.encode(&samples, format))
        .await
        .map_err(|e| ApiError::internal(format!("Audio encoding failed: {}", e)))??;

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, AudioEncoder::content_type(format))
        .header("X-Generation-Time-Ms", format!("{:.1}", result.total_time_ms))
        .header("X-Audio-Duration-Secs", format!("{:.2}", result.duration_secs()))
        .header("X-RTF", format!("{:.3}", result.rtf()))
        .header(
            "Access-Control-Expose-Headers",
            "X-Generation-Time-Ms, X-Audio-Duration-Secs, X-RTF",
        );

    if format == AudioFormat::Wav {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"speech.wav\"",
        );
    }

    builder
        .body(Body::from(audio_bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
