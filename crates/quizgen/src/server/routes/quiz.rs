//! Quiz generation and follow-up chat endpoints

use axum::{extract::State, Json};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::extraction;
use crate::generation::GenerationSpec;
use crate::providers;
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse, GenerateQuizRequest, GenerateResponse};

/// POST /api/quiz/generate - Generate a quiz from uploaded documents
pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuizRequest>,
) -> Result<Json<GenerateResponse>> {
    request.validate()?;

    let provider_config = request.provider_config();
    // Unsupported providers fail here, before any document work
    let service = providers::completion_service(&provider_config, &state.config().generation)?;
    let embedder = providers::embedding_provider(&provider_config, &state.config().generation)?;

    // Aggregate text across the requested documents and build their
    // indexes while the source files are still on disk.
    let mut fallback_text = String::new();
    for pdf_id in &request.pdf_ids {
        let path = staged_file(&state, pdf_id)?;
        if !path.exists() {
            continue;
        }

        let extracted = match extraction::extract_file(&path).await {
            Ok(extracted) => extracted,
            Err(e) => {
                tracing::warn!("Skipping document {}: {}", pdf_id, e);
                continue;
            }
        };

        fallback_text.push_str(&extracted.text);
        fallback_text.push_str("\n\n");

        match state
            .index()
            .get_or_create(pdf_id, &extracted.pages, embedder.as_ref())
            .await
        {
            Ok(_) => remove_staged_file(path),
            Err(e) => {
                // Keep the file so the post-generation sweep can retry cleanup
                tracing::warn!("Indexing failed for {}: {}", pdf_id, e);
            }
        }
    }

    if fallback_text.trim().is_empty() {
        return Err(Error::NotFound("No valid PDF content found".to_string()));
    }

    let templates = state.prompts().get_all().await?;

    let spec = GenerationSpec {
        pdf_ids: request.pdf_ids.clone(),
        types: request.types.clone(),
        type_counts: request.type_counts.clone(),
        quantity: request.quantity,
        custom_requirements: request.custom_requirements.clone(),
        persona: request.persona(),
        fallback_text,
    };

    let questions = state
        .generator()
        .generate(&spec, service.as_ref(), embedder.as_ref(), &templates)
        .await?;

    // The caller no longer needs the raw files once questions exist
    sweep_staged_files(state.clone(), request.pdf_ids.clone());

    Ok(Json(GenerateResponse {
        success: true,
        data: questions,
    }))
}

/// POST /api/quiz/chat - Answer a follow-up question about a quiz item
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    request.validate()?;

    let provider_config = request.provider_config();
    let service = providers::completion_service(&provider_config, &state.config().generation)?;
    let embedder = providers::embedding_provider(&provider_config, &state.config().generation)?;

    if let Some(pdf_id) = &request.pdf_id {
        validate_pdf_id(pdf_id)?;
    }

    let question = request
        .question
        .as_ref()
        .ok_or_else(|| Error::validation("Missing required parameters"))?;

    let reply = state
        .generator()
        .chat(
            question,
            request.user_query.as_deref().unwrap_or_default(),
            request.pdf_id.as_deref(),
            service.as_ref(),
            embedder.as_ref(),
        )
        .await?;

    Ok(Json(ChatResponse {
        success: true,
        reply,
    }))
}

/// Resolve a document id inside the upload directory
fn staged_file(state: &AppState, pdf_id: &str) -> Result<PathBuf> {
    validate_pdf_id(pdf_id)?;
    Ok(state.upload_dir().join(pdf_id))
}

/// Document ids are plain file names; anything path-like is rejected
fn validate_pdf_id(pdf_id: &str) -> Result<()> {
    let is_plain = !pdf_id.is_empty()
        && Path::new(pdf_id)
            .file_name()
            .is_some_and(|name| name == std::ffi::OsStr::new(pdf_id));
    if is_plain {
        Ok(())
    } else {
        Err(Error::validation(format!("Invalid document id: {}", pdf_id)))
    }
}

/// Delete one staged file off the request path
fn remove_staged_file(path: PathBuf) {
    tokio::spawn(async move {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!("Deleted staged file {}", path.display()),
            Err(e) => tracing::warn!("Failed to delete {}: {}", path.display(), e),
        }
    });
}

/// Delete any staged files left over after generation; best-effort,
/// decoupled from the response
fn sweep_staged_files(state: AppState, pdf_ids: Vec<String>) {
    tokio::spawn(async move {
        for pdf_id in pdf_ids {
            let path = state.upload_dir().join(&pdf_id);
            if path.exists() {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::warn!("Failed to delete {}: {}", path.display(), e);
                } else {
                    tracing::info!("Deleted temporary file {}", pdf_id);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_id_rejects_path_traversal() {
        assert!(validate_pdf_id("abc.pdf").is_ok());
        assert!(validate_pdf_id("../etc/passwd").is_err());
        assert!(validate_pdf_id("a/b.pdf").is_err());
        assert!(validate_pdf_id("").is_err());
    }
}
