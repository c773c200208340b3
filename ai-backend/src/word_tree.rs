//! The `/word-tree` endpoint: given a root morpheme and its source word,
//! ask the model for a derivation tree.
//!
//! Deliberately simpler than `/analyze`: one attempt on the primary model,
//! no truncation repair, no fallback tier, and every failure collapses to
//! one generic user-facing message.

use std::time::Duration;

use analysis_utils::{ErrorResponse, WordTreeRequest, WordTreeResult};
use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::analyze::{error_response, strip_markdown_fences};
use crate::error::AnalysisError;
use crate::gemini::{GeminiClient, GenerationParams};
use crate::prompt::{word_tree_user_message, WORD_TREE_SYSTEM_PROMPT};
use crate::validate::validate_word_tree;
use crate::AppState;

const WORD_TREE_TIMEOUT: Duration = Duration::from_millis(25_000);
const WORD_TREE_MAX_OUTPUT_TOKENS: u32 = 4096;
const WORD_TREE_TEMPERATURE: f32 = 0.2;

async fn generate_word_tree(
    client: &GeminiClient,
    root: &str,
    word: &str,
) -> Result<WordTreeResult, AnalysisError> {
    let params = GenerationParams {
        temperature: WORD_TREE_TEMPERATURE,
        max_output_tokens: WORD_TREE_MAX_OUTPUT_TOKENS,
        response_schema: None,
    };
    let raw = client
        .generate(
            &client.config().primary_model,
            WORD_TREE_SYSTEM_PROMPT,
            &word_tree_user_message(root, word),
            &params,
            WORD_TREE_TIMEOUT,
        )
        .await?;

    let text = strip_markdown_fences(&raw);
    let value: Value = serde_json::from_str(text).map_err(|e| {
        log::error!("[word-tree] JSON parse failed: {e}");
        AnalysisError::MalformedOutput
    })?;

    validate_word_tree(&value)
}

pub async fn word_tree(
    State(state): State<AppState>,
    Json(request): Json<WordTreeRequest>,
) -> Result<Json<WordTreeResult>, (StatusCode, Json<ErrorResponse>)> {
    let root = request.root.trim();
    if root.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Root is required"));
    }
    let word = request.word.trim();
    if word.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Word is required"));
    }

    match generate_word_tree(&state.gemini, root, word).await {
        Ok(result) => Ok(Json(result)),
        Err(error) => {
            log::error!("[word-tree] generation failed: {error}");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Word tree generation failed. Please try again.",
            ))
        }
    }
}
