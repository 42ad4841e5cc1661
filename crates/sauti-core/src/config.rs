//! Configuration types for the Sauti TTS runtime

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::catalog::VoiceVariant;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Device identifier, e.g. "cuda:0", "metal", "cpu"
    #[serde(default = "default_device")]
    pub device: String,

    /// Seconds a resident model may sit unused before the sweeper evicts it
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Period of the idle-sweep background task
    #[serde(default = "default_sweep_period_secs")]
    pub sweep_period_secs: u64,

    /// Per-variant model source overrides (HuggingFace repo ids)
    #[serde(default)]
    pub model_sources: ModelSources,

    /// Unix socket path of the inference daemon
    #[serde(default = "default_daemon_socket")]
    pub daemon_socket: PathBuf,

    /// Script launched when the daemon is not already running
    #[serde(default = "default_daemon_script")]
    pub daemon_script: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_period_secs: default_sweep_period_secs(),
            model_sources: ModelSources::default(),
            daemon_socket: default_daemon_socket(),
            daemon_script: default_daemon_script(),
        }
    }
}

impl EngineConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(device) = env_trimmed("SAUTI_DEVICE") {
            config.device = device;
        }
        if let Some(secs) = env_parsed("SAUTI_IDLE_TIMEOUT_SECS") {
            config.idle_timeout_secs = secs;
        }
        if let Some(secs) = env_parsed("SAUTI_SWEEP_PERIOD_SECS") {
            config.sweep_period_secs = secs;
        }
        if let Some(socket) = env_trimmed("SAUTI_SOCKET") {
            config.daemon_socket = PathBuf::from(socket);
        }

        config.model_sources = ModelSources::from_env();
        config
    }

    /// Resolve the model source for a variant, honoring overrides.
    pub fn model_source(&self, variant: VoiceVariant) -> String {
        self.model_sources
            .override_for(variant)
            .unwrap_or_else(|| variant.repo_id().to_string())
    }
}

/// Per-variant model source overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSources {
    #[serde(default)]
    pub custom_voice: Option<String>,
    #[serde(default)]
    pub voice_design: Option<String>,
    #[serde(default)]
    pub voice_clone: Option<String>,
}

impl ModelSources {
    pub fn from_env() -> Self {
        Self {
            custom_voice: env_trimmed("SAUTI_MODEL_CUSTOM_VOICE"),
            voice_design: env_trimmed("SAUTI_MODEL_VOICE_DESIGN"),
            voice_clone: env_trimmed("SAUTI_MODEL_VOICE_CLONE"),
        }
    }

    fn override_for(&self, variant: VoiceVariant) -> Option<String> {
        match variant {
            VoiceVariant::CustomVoice => self.custom_voice.clone(),
            VoiceVariant::VoiceDesign => self.voice_design.clone(),
            VoiceVariant::VoiceClone => self.voice_clone.clone(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_cors_enabled(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(host) = env_trimmed("SAUTI_HOST") {
            config.host = host;
        }
        if let Some(port) = env_parsed("SAUTI_PORT") {
            config.port = port;
        }
        config
    }
}

fn env_trimmed(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_trimmed(key).and_then(|v| v.parse().ok())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8766
}

fn default_cors_enabled() -> bool {
    true
}

fn default_device() -> String {
    "cuda:0".to_string()
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_sweep_period_secs() -> u64 {
    30
}

fn default_daemon_socket() -> PathBuf {
    PathBuf::from("/tmp/sauti_daemon.sock")
}

fn default_daemon_script() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("scripts/tts_daemon.py")
}
