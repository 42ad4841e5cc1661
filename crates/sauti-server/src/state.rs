//! Application state shared by request handlers

use std::sync::Arc;
use tokio::sync::Semaphore;

use sauti_core::SpeechService;

/// Shared application state with backpressure limits
#[derive(Clone)]
pub struct AppState {
    /// Service reference - using Arc for cheap clones
    pub service: Arc<SpeechService>,
    /// Concurrency limiter to prevent resource exhaustion
    pub request_semaphore: Arc<Semaphore>,
    /// Request timeout configuration (seconds)
    pub request_timeout_secs: u64,
}

impl AppState {
    pub fn new(service: SpeechService) -> Self {
        let max_concurrent = std::env::var("SAUTI_MAX_CONCURRENT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        let timeout = std::env::var("SAUTI_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        Self {
            service: Arc::new(service),
            request_semaphore: Arc::new(Semaphore::new(max_concurrent)),
            request_timeout_secs: timeout,
        }
    }

    /// Acquire a permit for concurrent request processing
    pub async fn acquire_permit(&self) -> tokio::sync::SemaphorePermit<'_> {
        self.request_semaphore
            .acquire()
            .await
            .expect("Semaphore should never be closed")
    }
}
