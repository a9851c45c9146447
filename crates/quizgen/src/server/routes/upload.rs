//! PDF upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::extraction;
use crate::generation::context::truncate_chars;
use crate::server::state::AppState;
use crate::types::{UploadResponse, UploadedPdf};

/// Multipart field carrying the files
const FILE_FIELD: &str = "pdfFiles";
/// Characters of extracted text returned as a preview
const PREVIEW_CHARS: usize = 150;

/// POST /api/pdf/upload - Accept PDF files and stage them for generation
pub async fn upload_pdfs(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let server = &state.config().server;
    let mut results = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::internal(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        if results.len() >= server.max_upload_files {
            return Err(Error::validation(format!(
                "Too many files: at most {} per upload",
                server.max_upload_files
            )));
        }

        let original_name = field
            .file_name()
            .map(|name| name.to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        if mime_guess::from_path(&original_name).first_or_octet_stream()
            != mime_guess::mime::APPLICATION_PDF
        {
            return Err(Error::validation(format!(
                "Only PDF files are accepted, got '{}'",
                original_name
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::internal(format!("Failed to read file: {}", e)))?;

        if data.len() > server.max_file_size {
            return Err(Error::validation(format!(
                "File '{}' exceeds the {}MB limit",
                original_name,
                server.max_file_size / (1024 * 1024)
            )));
        }

        tracing::info!("Processing file: {} ({} bytes)", original_name, data.len());

        let pdf_id = format!("{}.pdf", Uuid::new_v4());
        let path = state.upload_dir().join(&pdf_id);
        tokio::fs::write(&path, &data).await?;

        let bytes = data.to_vec();
        let extracted = tokio::task::spawn_blocking(move || extraction::extract(&bytes))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        results.push(UploadedPdf {
            file_url: format!("/uploads/{}", pdf_id),
            pdf_id,
            original_name,
            total_pages: extracted.total_pages,
            preview_text: format!("{}...", truncate_chars(&extracted.text, PREVIEW_CHARS)),
        });
    }

    if results.is_empty() {
        return Err(Error::validation("No files uploaded"));
    }

    Ok(Json(UploadResponse {
        success: true,
        data: results,
    }))
}
