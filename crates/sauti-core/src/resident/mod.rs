//! Resident-resource management.
//!
//! One model (and optionally the codec tokenizer) lives on the device at a
//! time. All loads, evictions, and status reads go through a single mutex,
//! so construction never races and observers never see a half-built slot.

mod sweeper;

pub use sweeper::IdleSweeper;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

use crate::catalog::VoiceVariant;
use crate::config::EngineConfig;
use crate::engine::{CodecTokenizer, DeviceMemoryStats, DeviceSpec, EngineBackend, SpeechModel};
use crate::error::{Error, Result};

/// The slots guarded by the manager's mutex.
///
/// Invariant: `variant` is `Some` exactly when `model` is. `last_use` is
/// refreshed once per successful acquisition, before the handle is
/// returned.
#[derive(Default)]
struct ResidentSlot {
    model: Option<Arc<dyn SpeechModel>>,
    variant: Option<VoiceVariant>,
    tokenizer: Option<Arc<dyn CodecTokenizer>>,
    last_use: Option<Instant>,
}

/// Point-in-time snapshot of the resident slot.
#[derive(Debug, Clone, Serialize)]
pub struct ResidentStatus {
    pub loaded: bool,
    pub variant: Option<VoiceVariant>,
    pub tokenizer_loaded: bool,
    /// Seconds since the last acquisition; `None` when nothing is resident.
    pub idle_seconds: Option<f32>,
    #[serde(flatten)]
    pub memory: Option<DeviceMemoryStats>,
}

/// Owns the resident model and tokenizer slots.
pub struct ResidentManager {
    backend: Arc<dyn EngineBackend>,
    device: DeviceSpec,
    config: EngineConfig,
    slot: Mutex<ResidentSlot>,
}

impl ResidentManager {
    pub fn new(
        backend: Arc<dyn EngineBackend>,
        device: DeviceSpec,
        config: EngineConfig,
    ) -> Self {
        Self {
            backend,
            device,
            config,
            slot: Mutex::new(ResidentSlot::default()),
        }
    }

    pub fn device(&self) -> &DeviceSpec {
        &self.device
    }

    /// Get a handle to the model for `variant`, loading it first if needed.
    ///
    /// The slot mutex is held for the whole call, including construction,
    /// so two callers can never both decide "not resident, load". The
    /// returned handle is used without the lock; a later eviction only
    /// drops the slot's reference.
    pub async fn acquire(&self, variant: VoiceVariant) -> Result<Arc<dyn SpeechModel>> {
        let mut slot = self.slot.lock().await;

        // Refresh first so a concurrent sweep cannot evict work in flight.
        slot.last_use = Some(Instant::now());

        if let (Some(model), Some(resident)) = (&slot.model, slot.variant) {
            if resident == variant {
                return Ok(model.clone());
            }
        }

        if slot.model.is_some() {
            info!("Switching resident model to {}", variant);
            let old = slot.model.take();
            slot.variant = None;
            self.release_blocking(old, None).await;
        }

        let source = self.config.model_source(variant);
        info!("Loading model {} ({})", variant, source);

        let backend = self.backend.clone();
        let device = self.device.clone();
        let model = tokio::task::spawn_blocking(move || backend.load_model(&source, &device))
            .await
            .map_err(|e| Error::ModelLoadError(format!("Load task failed: {}", e)))??;

        let model: Arc<dyn SpeechModel> = Arc::from(model);
        slot.model = Some(model.clone());
        slot.variant = Some(variant);

        info!("Model {} loaded", variant);
        Ok(model)
    }

    /// Get a handle to the codec tokenizer, loading it first if needed.
    /// Same contract as [`acquire`](Self::acquire), minus the variant key.
    pub async fn acquire_tokenizer(&self) -> Result<Arc<dyn CodecTokenizer>> {
        let mut slot = self.slot.lock().await;

        slot.last_use = Some(Instant::now());

        if let Some(tokenizer) = &slot.tokenizer {
            return Ok(tokenizer.clone());
        }

        info!("Loading codec tokenizer");

        let backend = self.backend.clone();
        let device = self.device.clone();
        let tokenizer = tokio::task::spawn_blocking(move || backend.load_tokenizer(&device))
            .await
            .map_err(|e| Error::ModelLoadError(format!("Load task failed: {}", e)))??;

        let tokenizer: Arc<dyn CodecTokenizer> = Arc::from(tokenizer);
        slot.tokenizer = Some(tokenizer.clone());
        Ok(tokenizer)
    }

    /// Evict the resident model and tokenizer, releasing device memory.
    /// Idempotent when nothing is resident.
    pub async fn offload(&self) {
        let mut slot = self.slot.lock().await;
        self.evict_locked(&mut slot).await;
    }

    /// Evict if the slot has sat unused past `idle_timeout`. Returns true
    /// when an eviction happened. The check and the eviction run under one
    /// lock acquisition, so an `acquire` refresh cannot interleave.
    pub async fn evict_if_idle(&self) -> bool {
        let mut slot = self.slot.lock().await;

        let occupied = slot.model.is_some() || slot.tokenizer.is_some();
        if !occupied {
            return false;
        }

        let idle = match slot.last_use {
            Some(last_use) => last_use.elapsed().as_secs(),
            None => return false,
        };

        if idle > self.config.idle_timeout_secs {
            info!("Evicting resident model (idle {}s)", idle);
            self.evict_locked(&mut slot).await;
            true
        } else {
            false
        }
    }

    async fn evict_locked(&self, slot: &mut ResidentSlot) {
        let model = slot.model.take();
        let tokenizer = slot.tokenizer.take();
        slot.variant = None;
        slot.last_use = None;
        if model.is_some() || tokenizer.is_some() {
            self.release_blocking(model, tokenizer).await;
        }
    }

    /// Drop resources and release cached device memory on the blocking
    /// pool. The slot lock stays held by the caller, so the teardown is
    /// still part of the exclusive region.
    async fn release_blocking(
        &self,
        model: Option<Arc<dyn SpeechModel>>,
        tokenizer: Option<Arc<dyn CodecTokenizer>>,
    ) {
        let backend = self.backend.clone();
        let device = self.device.clone();
        let joined = tokio::task::spawn_blocking(move || {
            drop(model);
            drop(tokenizer);
            backend.release_cached(&device);
        })
        .await;
        if joined.is_err() {
            info!("Device release task aborted");
        }
    }

    /// Consistent snapshot of the slot, read under the same lock as
    /// mutations.
    pub async fn status(&self) -> ResidentStatus {
        let slot = self.slot.lock().await;

        let loaded = slot.model.is_some();
        let occupied = loaded || slot.tokenizer.is_some();
        let idle_seconds = if occupied {
            slot.last_use.map(|t| t.elapsed().as_secs_f32())
        } else {
            None
        };

        let backend = self.backend.clone();
        let device = self.device.clone();
        let memory = tokio::task::spawn_blocking(move || backend.memory_stats(&device))
            .await
            .ok()
            .flatten();

        ResidentStatus {
            loaded,
            variant: slot.variant,
            tokenizer_loaded: slot.tokenizer.is_some(),
            idle_seconds,
            memory,
        }
    }
}
