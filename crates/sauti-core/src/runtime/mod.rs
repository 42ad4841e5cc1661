//! Runtime orchestration: the service facade over the resident manager.

mod service;
mod types;

pub use service::SpeechService;
pub use types::GenerationResult;
