//! Application state for the quiz generation server

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::QuizConfig;
use crate::error::Result;
use crate::generation::QuizGenerator;
use crate::index::IndexStore;
use crate::prompts::PromptStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: QuizConfig,
    /// Prompt template store
    prompts: PromptStore,
    /// Per-document vector indexes
    index: Arc<IndexStore>,
    /// Generation pipeline
    generator: QuizGenerator,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create new application state, ensuring storage directories exist
    pub fn new(config: QuizConfig) -> Result<Self> {
        tracing::info!(
            "Initializing application state (data dir: {})",
            config.storage.data_dir.display()
        );

        std::fs::create_dir_all(config.storage.upload_dir())?;
        std::fs::create_dir_all(config.storage.vector_dir())?;

        let prompts = PromptStore::new(config.storage.prompt_dir());
        let index = Arc::new(IndexStore::new(
            config.storage.vector_dir(),
            config.chunking.clone(),
        ));
        let generator = QuizGenerator::new(
            Arc::clone(&index),
            config.retrieval.clone(),
            config.generation.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                prompts,
                index,
                generator,
                ready: RwLock::new(true),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &QuizConfig {
        &self.inner.config
    }

    /// Get the prompt template store
    pub fn prompts(&self) -> &PromptStore {
        &self.inner.prompts
    }

    /// Get the vector index store
    pub fn index(&self) -> &Arc<IndexStore> {
        &self.inner.index
    }

    /// Get the generation pipeline
    pub fn generator(&self) -> &QuizGenerator {
        &self.inner.generator
    }

    /// Directory holding uploaded files
    pub fn upload_dir(&self) -> PathBuf {
        self.inner.config.storage.upload_dir()
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
