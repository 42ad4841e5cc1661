//! The service facade request handlers talk to.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use crate::audio::preprocess_reference_audio;
use crate::catalog::{self, VoiceVariant};
use crate::config::EngineConfig;
use crate::engine::{DeviceSpec, EngineBackend, SynthesisRequest};
use crate::error::{Error, Result};
use crate::resident::{IdleSweeper, ResidentManager, ResidentStatus};
use crate::runtime::types::GenerationResult;

/// Owns the resident manager and its idle sweeper. Constructed once at
/// startup and shut down explicitly; request handlers share it behind an
/// `Arc`.
pub struct SpeechService {
    manager: Arc<ResidentManager>,
    sweeper: Mutex<Option<IdleSweeper>>,
}

impl SpeechService {
    /// Build the service and start the idle sweeper.
    pub fn new(config: EngineConfig, backend: Arc<dyn EngineBackend>) -> Result<Self> {
        let device = DeviceSpec::parse(&config.device)?;
        info!("Speech service targeting device {}", device);

        let sweep_period = Duration::from_secs(config.sweep_period_secs.max(1));
        let manager = Arc::new(ResidentManager::new(backend, device, config));
        let sweeper = IdleSweeper::spawn(manager.clone(), sweep_period);

        Ok(Self {
            manager,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    /// Generate speech with the model for `variant`, loading or switching
    /// the resident model as needed. The generation itself runs outside
    /// the resident lock, so status reads stay responsive.
    pub async fn generate(
        &self,
        variant: VoiceVariant,
        mut request: SynthesisRequest,
    ) -> Result<GenerationResult> {
        validate_request(variant, &mut request)?;

        let model = self.manager.acquire(variant).await?;

        let start = std::time::Instant::now();
        let synthesis = tokio::task::spawn_blocking(move || model.generate(&request))
            .await
            .map_err(|e| Error::InferenceError(format!("Generation task failed: {}", e)))??;
        let total_time_ms = start.elapsed().as_secs_f32() * 1000.0;

        info!(
            "Generated {} samples in {:.1}ms",
            synthesis.samples.len(),
            total_time_ms
        );

        Ok(GenerationResult {
            request_id: uuid::Uuid::new_v4().to_string(),
            samples: synthesis.samples,
            sample_rate: synthesis.sample_rate,
            total_time_ms,
        })
    }

    /// Encode text with the resident codec tokenizer.
    pub async fn encode_text(&self, text: &str) -> Result<Vec<u32>> {
        let tokenizer = self.manager.acquire_tokenizer().await?;
        let text = text.to_string();
        tokio::task::spawn_blocking(move || tokenizer.encode(&text))
            .await
            .map_err(|e| Error::InferenceError(format!("Tokenize task failed: {}", e)))?
    }

    /// Decode codec tokens back to text.
    pub async fn decode_tokens(&self, tokens: Vec<u32>) -> Result<String> {
        let tokenizer = self.manager.acquire_tokenizer().await?;
        tokio::task::spawn_blocking(move || tokenizer.decode(&tokens))
            .await
            .map_err(|e| Error::InferenceError(format!("Tokenize task failed: {}", e)))?
    }

    /// Snapshot of the resident slot.
    pub async fn status(&self) -> ResidentStatus {
        self.manager.status().await
    }

    /// Evict the resident model and tokenizer.
    pub async fn offload(&self) {
        self.manager.offload().await;
    }

    pub fn speakers(&self) -> Vec<String> {
        catalog::speakers()
    }

    pub fn languages(&self) -> Vec<String> {
        catalog::languages()
    }

    /// Stop the sweeper, then empty the slot. Called once at process
    /// shutdown; safe to call again.
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().await.take();
        if let Some(sweeper) = sweeper {
            sweeper.shutdown().await;
        }
        self.manager.offload().await;
        info!("Speech service shut down");
    }
}

/// Validation happens before any acquire, so a bad request never costs a
/// model load.
fn validate_request(variant: VoiceVariant, request: &mut SynthesisRequest) -> Result<()> {
    if request.text.trim().is_empty() {
        return Err(Error::InvalidInput("text must not be empty".to_string()));
    }

    if let Some(language) = request.language.as_deref() {
        if !catalog::is_known_language(language) {
            return Err(Error::InvalidInput(format!(
                "Unknown language: {}",
                language
            )));
        }
    }

    match variant {
        VoiceVariant::CustomVoice => {
            if let Some(speaker) = request.speaker.as_deref() {
                if !catalog::is_known_speaker(speaker) {
                    return Err(Error::InvalidInput(format!(
                        "Unknown speaker: {}",
                        speaker
                    )));
                }
            }
        }
        VoiceVariant::VoiceDesign => {
            let described = request
                .instruct
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);
            if !described {
                return Err(Error::InvalidInput(
                    "voice_design requires a voice description".to_string(),
                ));
            }
        }
        VoiceVariant::VoiceClone => {
            let reference = request.reference.as_mut().ok_or_else(|| {
                Error::InvalidInput("voice_clone requires reference audio".to_string())
            })?;

            let samples = std::mem::take(&mut reference.samples);
            reference.samples = preprocess_reference_audio(samples, reference.sample_rate);
            if reference.samples.is_empty() {
                return Err(Error::InvalidInput(
                    "Reference audio is silent or invalid".to_string(),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReferenceAudio;

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest::new(text)
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut req = request("   ");
        assert!(matches!(
            validate_request(VoiceVariant::CustomVoice, &mut req),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_speaker_is_rejected() {
        let mut req = request("hello");
        req.speaker = Some("Nobody".to_string());
        assert!(validate_request(VoiceVariant::CustomVoice, &mut req).is_err());

        req.speaker = Some("Vivian".to_string());
        assert!(validate_request(VoiceVariant::CustomVoice, &mut req).is_ok());
    }

    #[test]
    fn voice_design_requires_description() {
        let mut req = request("hello");
        assert!(validate_request(VoiceVariant::VoiceDesign, &mut req).is_err());

        req.instruct = Some("a calm, low voice".to_string());
        assert!(validate_request(VoiceVariant::VoiceDesign, &mut req).is_ok());
    }

    #[test]
    fn voice_clone_requires_usable_reference() {
        let mut req = request("hello");
        assert!(validate_request(VoiceVariant::VoiceClone, &mut req).is_err());

        req.reference = Some(ReferenceAudio {
            samples: vec![0.0; 16000],
            sample_rate: 16000,
            transcript: None,
            x_vector_only: false,
        });
        // All-silence reference fails preprocessing.
        assert!(validate_request(VoiceVariant::VoiceClone, &mut req).is_err());

        req.reference = Some(ReferenceAudio {
            samples: (0..16000).map(|i| (i as f32 * 0.01).sin() * 0.4).collect(),
            sample_rate: 16000,
            transcript: Some("reference".to_string()),
            x_vector_only: false,
        });
        assert!(validate_request(VoiceVariant::VoiceClone, &mut req).is_ok());
    }

    #[test]
    fn unknown_language_is_rejected() {
        let mut req = request("hello");
        req.language = Some("Klingon".to_string());
        assert!(validate_request(VoiceVariant::CustomVoice, &mut req).is_err());
    }
}
