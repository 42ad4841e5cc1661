//! The engine boundary.
//!
//! The speech model itself is an external collaborator reached through the
//! traits here: the runtime constructs it, generates against it, and
//! destroys it, but never looks inside. The production backend is
//! [`bridge::DaemonBridge`]; tests substitute counting mocks.

pub mod bridge;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A loaded speech model resident on the device.
///
/// Handles are reference-counted: eviction drops the resident slot's
/// reference, and device teardown happens when the last clone drops. An
/// in-flight generation therefore keeps its engine alive across a
/// concurrent variant switch.
pub trait SpeechModel: Send + Sync {
    /// Run one synthesis call. Errors here never affect resident state.
    fn generate(&self, request: &SynthesisRequest) -> Result<Synthesis>;
}

/// The codec tokenizer, a second resident resource with a fixed identity.
pub trait CodecTokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
    fn decode(&self, tokens: &[u32]) -> Result<String>;
}

/// Constructs models and tokenizers on a device and reports device memory.
///
/// Construction is blocking (weights load, device transfer); the resident
/// manager wraps calls in `spawn_blocking`.
pub trait EngineBackend: Send + Sync {
    fn load_model(&self, source: &str, device: &DeviceSpec) -> Result<Box<dyn SpeechModel>>;

    fn load_tokenizer(&self, device: &DeviceSpec) -> Result<Box<dyn CodecTokenizer>>;

    /// Point-in-time device memory usage, if the backend can report it.
    fn memory_stats(&self, device: &DeviceSpec) -> Option<DeviceMemoryStats>;

    /// Release cached allocations after an eviction. Idempotent.
    fn release_cached(&self, device: &DeviceSpec);
}

/// Device kinds the runtime can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cuda,
    Metal,
    Cpu,
}

/// A parsed device identifier, e.g. "cuda:0"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSpec {
    pub kind: DeviceKind,
    pub ordinal: usize,
}

impl DeviceSpec {
    /// Parse an identifier string like `cuda:0`, `metal`, or `cpu`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (name, ordinal) = match trimmed.split_once(':') {
            Some((name, idx)) => {
                let ordinal = idx.parse::<usize>().map_err(|_| {
                    Error::ConfigError(format!("Invalid device ordinal in '{}'", input))
                })?;
                (name, ordinal)
            }
            None => (trimmed, 0),
        };

        let kind = match name.to_ascii_lowercase().as_str() {
            "cuda" | "gpu" => DeviceKind::Cuda,
            "metal" | "mps" => DeviceKind::Metal,
            "cpu" => DeviceKind::Cpu,
            other => {
                return Err(Error::ConfigError(format!(
                    "Unknown device kind: {}",
                    other
                )))
            }
        };

        Ok(Self { kind, ordinal })
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DeviceKind::Cuda => write!(f, "cuda:{}", self.ordinal),
            DeviceKind::Metal => write!(f, "metal"),
            DeviceKind::Cpu => write!(f, "cpu"),
        }
    }
}

/// Device memory usage snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceMemoryStats {
    pub device_name: Option<String>,
    pub memory_allocated_mb: u64,
    pub memory_reserved_mb: u64,
}

/// Sampling parameters for one synthesis call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisParams {
    #[serde(default = "default_do_sample")]
    pub do_sample: bool,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,
    #[serde(default = "default_top_k")]
    pub subtalker_top_k: usize,
    #[serde(default = "default_top_p")]
    pub subtalker_top_p: f32,
    #[serde(default = "default_temperature")]
    pub subtalker_temperature: f32,
}

fn default_do_sample() -> bool {
    true
}
fn default_top_k() -> usize {
    50
}
fn default_top_p() -> f32 {
    0.9
}
fn default_temperature() -> f32 {
    1.0
}
fn default_repetition_penalty() -> f32 {
    1.05
}
fn default_max_new_tokens() -> usize {
    2048
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            do_sample: default_do_sample(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            temperature: default_temperature(),
            repetition_penalty: default_repetition_penalty(),
            max_new_tokens: default_max_new_tokens(),
            subtalker_top_k: default_top_k(),
            subtalker_top_p: default_top_p(),
            subtalker_temperature: default_temperature(),
        }
    }
}

/// Reference audio for voice cloning, already decoded and preprocessed
#[derive(Debug, Clone)]
pub struct ReferenceAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub transcript: Option<String>,
    /// Use only the speaker embedding, skipping in-context learning
    pub x_vector_only: bool,
}

/// One synthesis call against a resident model
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: Option<String>,
    pub speaker: Option<String>,
    /// Style instruction (CustomVoice) or voice description (VoiceDesign)
    pub instruct: Option<String>,
    pub reference: Option<ReferenceAudio>,
    pub params: SynthesisParams,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            speaker: None,
            instruct: None,
            reference: None,
            params: SynthesisParams::default(),
        }
    }
}

/// Audio produced by one synthesis call
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}
