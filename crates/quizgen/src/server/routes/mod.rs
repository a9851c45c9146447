//! API routes for the quiz generation server

pub mod prompt;
pub mod quiz;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(upload_body_limit: usize) -> Router<AppState> {
    Router::new()
        // Prompt template management
        .route(
            "/system/prompt",
            get(prompt::get_prompt).post(prompt::save_prompt),
        )
        // Upload - with larger body limit for multipart files
        .route(
            "/pdf/upload",
            post(upload::upload_pdfs).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        // Generation and follow-up chat
        .route("/quiz/generate", post(quiz::generate_quiz))
        .route("/quiz/chat", post(quiz::chat))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "quizgen",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Quiz generation from PDF documents with page citations",
        "endpoints": {
            "GET /api/system/prompt": "Fetch a prompt template by type",
            "POST /api/system/prompt": "Save a prompt template",
            "POST /api/pdf/upload": "Upload PDF documents (multipart, field 'pdfFiles')",
            "POST /api/quiz/generate": "Generate quiz questions from uploaded documents",
            "POST /api/quiz/chat": "Ask a follow-up question about a quiz item"
        }
    }))
}
