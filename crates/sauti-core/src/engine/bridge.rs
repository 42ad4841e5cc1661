//! Bridge to the persistent inference daemon.
//!
//! The daemon owns the actual model weights and the device; this module
//! speaks its newline-delimited JSON protocol over a Unix socket and adapts
//! it to the [`EngineBackend`] boundary.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::audio::{decode_wav_bytes, encode_wav_bytes};
use crate::config::EngineConfig;
use crate::engine::{
    CodecTokenizer, DeviceMemoryStats, DeviceSpec, EngineBackend, SpeechModel, Synthesis,
    SynthesisRequest,
};
use crate::error::{Error, Result};

/// Request to the inference daemon
#[derive(Debug, Default, Serialize)]
struct BridgeRequest {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instruct: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_audio_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x_vector_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<Vec<u32>>,
}

/// Response from the inference daemon
#[derive(Debug, Deserialize)]
struct BridgeResponse {
    error: Option<String>,
    audio_base64: Option<String>,
    tokens: Option<Vec<u32>>,
    text: Option<String>,
    device_name: Option<String>,
    memory_allocated_mb: Option<u64>,
    memory_reserved_mb: Option<u64>,
}

impl BridgeResponse {
    fn into_result(self) -> Result<Self> {
        if let Some(err) = self.error {
            return Err(Error::InferenceError(err));
        }
        Ok(self)
    }
}

/// Shared connection endpoint. Each call opens a fresh stream; the daemon
/// serializes requests on its side.
#[derive(Debug, Clone)]
struct BridgeClient {
    socket_path: PathBuf,
}

impl BridgeClient {
    fn call(&self, request: &BridgeRequest) -> Result<BridgeResponse> {
        let mut stream = UnixStream::connect(&self.socket_path).map_err(|e| {
            Error::InferenceError(format!(
                "Failed to connect to daemon at {:?}: {}",
                self.socket_path, e
            ))
        })?;
        stream
            .set_read_timeout(Some(Duration::from_secs(600)))
            .ok();

        let mut payload = serde_json::to_vec(request)
            .map_err(|e| Error::InferenceError(format!("Failed to encode request: {}", e)))?;
        payload.push(b'\n');
        stream.write_all(&payload)?;
        stream.shutdown(Shutdown::Write).ok();

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;

        let response: BridgeResponse = serde_json::from_str(line.trim()).map_err(|e| {
            Error::InferenceError(format!("Invalid response from daemon: {}", e))
        })?;
        response.into_result()
    }
}

/// Production [`EngineBackend`] backed by the inference daemon.
pub struct DaemonBridge {
    client: BridgeClient,
    daemon_script: PathBuf,
    python_cmd: String,
    daemon_process: Mutex<Option<Child>>,
}

impl DaemonBridge {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            client: BridgeClient {
                socket_path: config.daemon_socket.clone(),
            },
            daemon_script: config.daemon_script.clone(),
            python_cmd: "python3".to_string(),
            daemon_process: Mutex::new(None),
        }
    }

    fn is_daemon_running(&self) -> bool {
        self.client.socket_path.exists()
            && self
                .client
                .call(&BridgeRequest {
                    command: "check".to_string(),
                    ..Default::default()
                })
                .is_ok()
    }

    /// Start the daemon if not already running.
    pub fn ensure_daemon_running(&self) -> Result<()> {
        if self.is_daemon_running() {
            debug!("Inference daemon already running");
            return Ok(());
        }

        info!("Starting inference daemon...");

        let child = Command::new(&self.python_cmd)
            .arg(&self.daemon_script)
            .arg("--socket")
            .arg(&self.client.socket_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::ModelLoadError(format!("Failed to start daemon: {}", e)))?;

        {
            let mut guard = self.daemon_process.lock().unwrap();
            *guard = Some(child);
        }

        // Wait for the socket to come up (up to 10 seconds).
        for i in 0..100 {
            std::thread::sleep(Duration::from_millis(100));
            if self.is_daemon_running() {
                info!("Inference daemon started");
                return Ok(());
            }
            if i % 20 == 0 {
                debug!("Waiting for daemon to start... ({}/10s)", i / 10);
            }
        }

        Err(Error::ModelLoadError(
            "Daemon failed to start within 10 seconds".to_string(),
        ))
    }
}

impl EngineBackend for DaemonBridge {
    fn load_model(&self, source: &str, device: &DeviceSpec) -> Result<Box<dyn SpeechModel>> {
        self.ensure_daemon_running()?;

        self.client
            .call(&BridgeRequest {
                command: "load".to_string(),
                model: Some(source.to_string()),
                device: Some(device.to_string()),
                ..Default::default()
            })
            .map_err(|e| Error::ModelLoadError(e.to_string()))?;

        Ok(Box::new(BridgeModel {
            client: self.client.clone(),
            source: source.to_string(),
        }))
    }

    fn load_tokenizer(&self, device: &DeviceSpec) -> Result<Box<dyn CodecTokenizer>> {
        self.ensure_daemon_running()?;

        self.client
            .call(&BridgeRequest {
                command: "load_tokenizer".to_string(),
                device: Some(device.to_string()),
                ..Default::default()
            })
            .map_err(|e| Error::ModelLoadError(e.to_string()))?;

        Ok(Box::new(BridgeTokenizer {
            client: self.client.clone(),
        }))
    }

    fn memory_stats(&self, device: &DeviceSpec) -> Option<DeviceMemoryStats> {
        let response = self
            .client
            .call(&BridgeRequest {
                command: "status".to_string(),
                device: Some(device.to_string()),
                ..Default::default()
            })
            .ok()?;

        Some(DeviceMemoryStats {
            device_name: response.device_name,
            memory_allocated_mb: response.memory_allocated_mb?,
            memory_reserved_mb: response.memory_reserved_mb.unwrap_or(0),
        })
    }

    fn release_cached(&self, device: &DeviceSpec) {
        let result = self.client.call(&BridgeRequest {
            command: "empty_cache".to_string(),
            device: Some(device.to_string()),
            ..Default::default()
        });
        if let Err(e) = result {
            debug!("empty_cache request failed: {}", e);
        }
    }
}

impl Drop for DaemonBridge {
    fn drop(&mut self) {
        let mut guard = self.daemon_process.lock().unwrap();
        if let Some(mut child) = guard.take() {
            info!("Stopping inference daemon");
            if let Err(e) = child.kill() {
                warn!("Failed to kill daemon process: {}", e);
            }
            child.wait().ok();
        }
    }
}

/// A model resident in the daemon. `generate` round-trips WAV audio over
/// the socket; dropping the handle asks the daemon to free the weights.
struct BridgeModel {
    client: BridgeClient,
    source: String,
}

impl SpeechModel for BridgeModel {
    fn generate(&self, request: &SynthesisRequest) -> Result<Synthesis> {
        let ref_audio_base64 = match &request.reference {
            Some(reference) => {
                use base64::Engine;
                let wav = encode_wav_bytes(&reference.samples, reference.sample_rate)?;
                Some(base64::engine::general_purpose::STANDARD.encode(wav))
            }
            None => None,
        };

        let params = serde_json::to_value(&request.params)
            .map_err(|e| Error::InferenceError(format!("Failed to encode params: {}", e)))?;

        let response = self.client.call(&BridgeRequest {
            command: "generate".to_string(),
            model: Some(self.source.clone()),
            text: Some(request.text.clone()),
            language: request.language.clone(),
            speaker: request.speaker.clone(),
            instruct: request.instruct.clone(),
            ref_audio_base64,
            ref_text: request
                .reference
                .as_ref()
                .and_then(|r| r.transcript.clone()),
            x_vector_only: request.reference.as_ref().map(|r| r.x_vector_only),
            params: Some(params),
            ..Default::default()
        })?;

        let audio_base64 = response
            .audio_base64
            .ok_or_else(|| Error::InferenceError("Daemon returned no audio".to_string()))?;

        use base64::Engine;
        let wav_bytes = base64::engine::general_purpose::STANDARD
            .decode(audio_base64.as_bytes())
            .map_err(|e| Error::InferenceError(format!("Base64 decode error: {}", e)))?;

        let (samples, sample_rate) = decode_wav_bytes(&wav_bytes)?;
        Ok(Synthesis {
            samples,
            sample_rate,
        })
    }
}

impl Drop for BridgeModel {
    fn drop(&mut self) {
        let result = self.client.call(&BridgeRequest {
            command: "unload".to_string(),
            model: Some(self.source.clone()),
            ..Default::default()
        });
        if let Err(e) = result {
            debug!("unload request failed: {}", e);
        }
    }
}

/// The codec tokenizer resident in the daemon.
struct BridgeTokenizer {
    client: BridgeClient,
}

impl CodecTokenizer for BridgeTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let response = self.client.call(&BridgeRequest {
            command: "encode".to_string(),
            text: Some(text.to_string()),
            ..Default::default()
        })?;
        response
            .tokens
            .ok_or_else(|| Error::InferenceError("Daemon returned no tokens".to_string()))
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        let response = self.client.call(&BridgeRequest {
            command: "decode".to_string(),
            tokens: Some(tokens.to_vec()),
            ..Default::default()
        })?;
        response
            .text
            .ok_or_else(|| Error::InferenceError("Daemon returned no text".to_string()))
    }
}

impl Drop for BridgeTokenizer {
    fn drop(&mut self) {
        let result = self.client.call(&BridgeRequest {
            command: "unload_tokenizer".to_string(),
            ..Default::default()
        });
        if let Err(e) = result {
            debug!("unload_tokenizer request failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_responses_surface_as_inference_errors() {
        let response = BridgeResponse {
            error: Some("CUDA out of memory".to_string()),
            audio_base64: None,
            tokens: None,
            text: None,
            device_name: None,
            memory_allocated_mb: None,
            memory_reserved_mb: None,
        };
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, Error::InferenceError(_)));
    }

    #[test]
    fn request_serialization_skips_unset_fields() {
        let request = BridgeRequest {
            command: "check".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, "{\"command\":\"check\"}");
    }
}
