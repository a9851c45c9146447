//! Quiz generation server binary
//!
//! Run with: cargo run -p quizgen --bin quizgen-server

use std::path::PathBuf;

use quizgen::{config::QuizConfig, server::QuizServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizgen=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration: QUIZGEN_CONFIG or ./quizgen.toml, else defaults
    let config_path = std::env::var("QUIZGEN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("quizgen.toml"));
    let config = QuizConfig::load_or_default(&config_path)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Data dir: {}", config.storage.data_dir.display());
    tracing::info!("  - Embedding model: {}", config.generation.embedding_model);
    tracing::info!("  - Batch size: {}", config.generation.batch_size);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    let server = QuizServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/pdf/upload    - Upload PDF documents");
    println!("  POST /api/quiz/generate - Generate quiz questions");
    println!("  POST /api/quiz/chat     - Follow-up Q&A on a quiz item");
    println!("  GET  /api/system/prompt - Prompt template management");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
