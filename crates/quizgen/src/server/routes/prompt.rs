//! Prompt template management endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::prompts::DEFAULT_TYPE;
use crate::server::state::AppState;
use crate::types::{PromptContentResponse, SavePromptRequest, SavePromptResponse};

/// Query string of `GET /api/system/prompt`
#[derive(Debug, Deserialize)]
pub struct PromptQuery {
    #[serde(rename = "type")]
    pub prompt_type: Option<String>,
}

/// GET /api/system/prompt - Fetch the template for a question type
pub async fn get_prompt(
    State(state): State<AppState>,
    Query(query): Query<PromptQuery>,
) -> Result<Json<PromptContentResponse>> {
    let prompt_type = query
        .prompt_type
        .unwrap_or_else(|| DEFAULT_TYPE.to_string());
    let prompt = state.prompts().get(&prompt_type).await?;

    Ok(Json(PromptContentResponse {
        success: true,
        prompt,
        prompt_type,
    }))
}

/// POST /api/system/prompt - Save a template
pub async fn save_prompt(
    State(state): State<AppState>,
    Json(request): Json<SavePromptRequest>,
) -> Result<Json<SavePromptResponse>> {
    let prompt = request
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::validation("Prompt content is required"))?;

    let prompt_type = request
        .prompt_type
        .unwrap_or_else(|| DEFAULT_TYPE.to_string());
    state.prompts().save(&prompt_type, &prompt).await?;

    Ok(Json(SavePromptResponse {
        success: true,
        message: "Prompt saved successfully".to_string(),
    }))
}
