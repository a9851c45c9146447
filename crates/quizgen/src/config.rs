//! Configuration for the quiz generation service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
///
/// Every component receives the section it needs at construction time;
/// nothing reads configuration through globals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage locations
    #[serde(default)]
    pub storage: StorageConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// LLM generation configuration
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Text chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

impl QuizConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load from the given path if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum number of files per upload request
    pub max_upload_files: usize,
    /// Maximum size of a single uploaded file in bytes
    pub max_file_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            max_upload_files: 5,
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ServerConfig {
    /// Request body limit for the upload route: all files plus multipart framing
    pub fn upload_body_limit(&self) -> usize {
        self.max_file_size * self.max_upload_files + 1024 * 1024
    }
}

/// Storage locations for prompts, vector indexes, and uploaded files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base data directory
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizgen");

        Self { data_dir }
    }
}

impl StorageConfig {
    /// Directory holding prompt template files
    pub fn prompt_dir(&self) -> PathBuf {
        self.data_dir.join("prompts")
    }

    /// Directory holding per-document vector indexes
    pub fn vector_dir(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }

    /// Directory holding uploaded files awaiting generation
    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of documents queried per generation request
    pub max_documents: usize,
    /// Ranked chunks requested per document
    pub top_k: usize,
    /// Maximum merged chunks kept after deduplication
    pub max_chunks: usize,
    /// Characters of raw text used when retrieval yields nothing
    pub fallback_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_documents: 3,
            top_k: 5,
            max_chunks: 10,
            fallback_chars: 15_000,
        }
    }
}

/// LLM generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum questions requested per LLM call
    pub batch_size: u32,
    /// Total questions when the request gives no quantity
    pub default_quantity: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Transport-level retries for transient failures
    pub max_retries: u32,
    /// Embedding model used for index construction and queries
    pub embedding_model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            default_quantity: 10,
            temperature: 0.7,
            timeout_secs: 300, // 5 minutes
            max_retries: 2,
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (skip smaller chunks)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 50,
        }
    }
}
