use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use umpire_core::templates::TemplateStore;

use crate::core::app_state::AppState;
use crate::error_handler::AppResult;

#[derive(Debug, Serialize)]
pub struct PromptsResponse {
    pub core_prompt: String,
    pub additional_prompt: String,
}

/// Returns the current prompt templates.
pub async fn get_prompts_route(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<PromptsResponse>> {
    let core_prompt = state
        .templates
        .core_template()
        .map_err(umpire_core::Error::from)?;
    let additional_prompt = state
        .templates
        .additional_instructions()
        .map_err(umpire_core::Error::from)?;
    Ok(Json(PromptsResponse {
        core_prompt,
        additional_prompt,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PromptsUpdateRequest {
    pub additional_prompt: String,
}

#[derive(Debug, Serialize)]
pub struct PromptsUpdateResponse {
    pub message: &'static str,
}

/// Replaces the user-editable additional-instructions fragment. The core
/// template is not editable through the API.
pub async fn update_prompts_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PromptsUpdateRequest>,
) -> AppResult<Json<PromptsUpdateResponse>> {
    state
        .templates
        .set_additional_instructions(&body.additional_prompt)
        .map_err(umpire_core::Error::from)?;
    Ok(Json(PromptsUpdateResponse {
        message: "プロンプトが更新されました",
    }))
}
