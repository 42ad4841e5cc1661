//! Sauti Core - GPU-resident TTS serving runtime
//!
//! This crate manages a single costly speech model resident on the device,
//! shared by all concurrent callers:
//!
//! - `resident`: the resident-slot manager and its idle sweeper
//! - `engine`: the opaque engine boundary (traits + daemon bridge)
//! - `runtime`: the service facade request handlers use
//! - `catalog`: the closed set of voice variants, speakers, languages
//!
//! # Example
//!
//! ```ignore
//! use sauti_core::{EngineConfig, SpeechService, VoiceVariant};
//! use sauti_core::engine::bridge::DaemonBridge;
//! use sauti_core::engine::SynthesisRequest;
//! use std::sync::Arc;
//!
//! let config = EngineConfig::from_env();
//! let backend = Arc::new(DaemonBridge::new(&config));
//! let service = SpeechService::new(config, backend)?;
//!
//! let result = service
//!     .generate(VoiceVariant::CustomVoice, SynthesisRequest::new("Hello!"))
//!     .await?;
//! ```

pub mod audio;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod resident;
pub mod runtime;

pub use catalog::{parse_voice_variant, VoiceVariant};
pub use config::{EngineConfig, ServerConfig};
pub use engine::{
    DeviceKind, DeviceMemoryStats, DeviceSpec, EngineBackend, SpeechModel, SynthesisParams,
    SynthesisRequest,
};
pub use error::{Error, Result};
pub use resident::{IdleSweeper, ResidentManager, ResidentStatus};
pub use runtime::{GenerationResult, SpeechService};
