//! Speaker and language catalog endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct SpeakersResponse {
    pub speakers: Vec<String>,
}

#[derive(Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<String>,
}

/// Preset speakers supported by the CustomVoice model
pub async fn list_speakers(State(state): State<AppState>) -> Json<SpeakersResponse> {
    Json(SpeakersResponse {
        speakers: state.service.speakers(),
    })
}

/// Languages accepted by all variants
pub async fn list_languages(State(state): State<AppState>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: state.service.languages(),
    })
}
