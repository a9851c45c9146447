//! Persisted per-document vector indexes

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

use super::chunker::TextChunker;

const INDEX_FILE: &str = "index.json";

/// A ranked chunk returned from retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// Source page number, 1-indexed
    pub page: u32,
    /// Chunk text
    pub content: String,
}

/// One embedded chunk inside a document index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub page: u32,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Searchable index over one document's chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentIndex {
    pub document_id: String,
    pub chunks: Vec<IndexedChunk>,
}

impl DocumentIndex {
    /// Rank chunks by cosine similarity against a query embedding
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<RetrievedChunk> {
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(query, &chunk.embedding), chunk))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(_, chunk)| RetrievedChunk {
                page: chunk.page,
                content: chunk.content.clone(),
            })
            .collect()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Store of per-document indexes persisted under a fixed directory.
///
/// Index publication writes to a temp file and renames it into place, so a
/// racing creator can duplicate work but never hands a reader a partial
/// index.
pub struct IndexStore {
    root: PathBuf,
    chunking: ChunkingConfig,
}

impl IndexStore {
    pub fn new(root: PathBuf, chunking: ChunkingConfig) -> Self {
        Self { root, chunking }
    }

    fn index_path(&self, document_id: &str) -> PathBuf {
        self.root.join(document_id).join(INDEX_FILE)
    }

    /// Whether a persisted index exists for the document
    pub fn exists(&self, document_id: &str) -> bool {
        self.index_path(document_id).exists()
    }

    /// Load the persisted index for a document, or build one from the given
    /// page texts and persist it.
    ///
    /// An index built from no usable text is returned empty and not
    /// persisted, so a later call with real pages can still build it.
    pub async fn get_or_create(
        &self,
        document_id: &str,
        pages: &[String],
        embedder: &dyn EmbeddingProvider,
    ) -> Result<DocumentIndex> {
        let path = self.index_path(document_id);
        if path.exists() {
            tracing::debug!("Loading existing index for document {}", document_id);
            let bytes = tokio::fs::read(&path).await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        tracing::info!("Building index for document {}", document_id);
        let index = self.build(document_id, pages, embedder).await?;
        if !index.chunks.is_empty() {
            self.publish(&index).await?;
        }
        Ok(index)
    }

    /// Retrieve the top-ranked chunks for a query.
    ///
    /// Failures are logged and yield an empty list; a caller can always fall
    /// back to raw document text.
    pub async fn retrieve_context(
        &self,
        document_id: &str,
        query: &str,
        embedder: &dyn EmbeddingProvider,
        pages: &[String],
        top_k: usize,
    ) -> Vec<RetrievedChunk> {
        match self
            .retrieve(document_id, query, embedder, pages, top_k)
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::warn!("Context retrieval failed for document {}: {}", document_id, e);
                Vec::new()
            }
        }
    }

    async fn retrieve(
        &self,
        document_id: &str,
        query: &str,
        embedder: &dyn EmbeddingProvider,
        pages: &[String],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let index = self.get_or_create(document_id, pages, embedder).await?;
        if index.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = embedder.embed(query).await?;
        Ok(index.search(&query_embedding, top_k))
    }

    async fn build(
        &self,
        document_id: &str,
        pages: &[String],
        embedder: &dyn EmbeddingProvider,
    ) -> Result<DocumentIndex> {
        let chunker = TextChunker::new(&self.chunking);

        let mut page_numbers = Vec::new();
        let mut contents = Vec::new();
        for (i, page) in pages.iter().enumerate() {
            if page.trim().is_empty() {
                continue;
            }
            for chunk in chunker.split(page) {
                page_numbers.push((i + 1) as u32);
                contents.push(chunk);
            }
        }

        if contents.is_empty() {
            return Ok(DocumentIndex {
                document_id: document_id.to_string(),
                chunks: Vec::new(),
            });
        }

        let embeddings = embedder.embed_batch(&contents).await?;
        if embeddings.len() != contents.len() {
            return Err(Error::internal(format!(
                "Embedding count mismatch: {} chunks, {} embeddings",
                contents.len(),
                embeddings.len()
            )));
        }

        let chunks = page_numbers
            .into_iter()
            .zip(contents)
            .zip(embeddings)
            .map(|((page, content), embedding)| IndexedChunk {
                page,
                content,
                embedding,
            })
            .collect();

        Ok(DocumentIndex {
            document_id: document_id.to_string(),
            chunks,
        })
    }

    /// Write the index to a temp file in its final directory, then rename
    async fn publish(&self, index: &DocumentIndex) -> Result<()> {
        let dir = self.root.join(&index.document_id);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(INDEX_FILE);
        let bytes = serde_json::to_vec(index)?;

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&path).map_err(|e| Error::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic embedder: a 3-dim vector derived from text statistics
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let len = text.len() as f32;
            let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count() as f32;
            Ok(vec![len, vowels, 1.0])
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::llm("embedding backend down"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn store() -> (tempfile::TempDir, IndexStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().to_path_buf(), ChunkingConfig::default());
        (dir, store)
    }

    #[test]
    fn search_ranks_by_cosine_similarity() {
        let index = DocumentIndex {
            document_id: "doc".to_string(),
            chunks: vec![
                IndexedChunk {
                    page: 1,
                    content: "north".to_string(),
                    embedding: vec![0.0, 1.0],
                },
                IndexedChunk {
                    page: 2,
                    content: "east".to_string(),
                    embedding: vec![1.0, 0.0],
                },
            ],
        };

        let results = index.search(&[1.0, 0.1], 2);
        assert_eq!(results[0].content, "east");
        assert_eq!(results[0].page, 2);
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn build_publishes_and_reload_wins() {
        let (_dir, store) = store();
        let pages = vec!["Photosynthesis converts light into chemical energy.".to_string()];

        let built = store
            .get_or_create("doc-1", &pages, &StubEmbedder)
            .await
            .unwrap();
        assert!(!built.chunks.is_empty());
        assert!(store.exists("doc-1"));

        // A second call loads the persisted index instead of rebuilding
        let other_pages = vec!["Entirely different text.".to_string()];
        let reloaded = store
            .get_or_create("doc-1", &other_pages, &StubEmbedder)
            .await
            .unwrap();
        assert_eq!(reloaded.chunks[0].content, built.chunks[0].content);
    }

    #[tokio::test]
    async fn empty_pages_build_nothing_and_persist_nothing() {
        let (_dir, store) = store();
        let index = store
            .get_or_create("doc-2", &[], &StubEmbedder)
            .await
            .unwrap();
        assert!(index.chunks.is_empty());
        assert!(!store.exists("doc-2"));
    }

    #[tokio::test]
    async fn retrieval_failure_yields_empty_list() {
        let (_dir, store) = store();
        let pages = vec!["Some page text that would need embedding.".to_string()];
        let chunks = store
            .retrieve_context("doc-3", "query", &FailingEmbedder, &pages, 5)
            .await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn retrieve_returns_ranked_chunks() {
        let (_dir, store) = store();
        let pages = vec![
            "Mitochondria are the powerhouse of the cell.".to_string(),
            "The Krebs cycle produces ATP in the matrix.".to_string(),
        ];
        store
            .get_or_create("doc-4", &pages, &StubEmbedder)
            .await
            .unwrap();

        let chunks = store
            .retrieve_context("doc-4", "powerhouse", &StubEmbedder, &[], 1)
            .await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].page >= 1);
    }
}
