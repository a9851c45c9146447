//! Response bodies for the HTTP API

use serde::Serialize;

use crate::types::Question;

/// Metadata for one successfully uploaded file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPdf {
    /// Opaque document id used in later generation requests
    pub pdf_id: String,
    /// Client-supplied file name
    pub original_name: String,
    pub total_pages: u32,
    /// Leading text excerpt for display
    pub preview_text: String,
    /// Where the raw file can be fetched until cleanup
    pub file_url: String,
}

/// Response of `POST /api/pdf/upload`
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub data: Vec<UploadedPdf>,
}

/// Response of `POST /api/quiz/generate`
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub data: Vec<Question>,
}

/// Response of `POST /api/quiz/chat`
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub reply: String,
}

/// Response of `GET /api/system/prompt`
#[derive(Debug, Serialize)]
pub struct PromptContentResponse {
    pub success: bool,
    pub prompt: String,
    #[serde(rename = "type")]
    pub prompt_type: String,
}

/// Response of `POST /api/system/prompt`
#[derive(Debug, Serialize)]
pub struct SavePromptResponse {
    pub success: bool,
    pub message: String,
}
