//! Context assembly for generation prompts

use std::collections::HashSet;

use crate::config::RetrievalConfig;
use crate::index::{IndexStore, RetrievedChunk};
use crate::providers::EmbeddingProvider;

/// Builds the reference-context block of a generation prompt from
/// per-document retrieval, with raw-text truncation as the fallback.
pub struct ContextBuilder<'a> {
    index: &'a IndexStore,
    retrieval: &'a RetrievalConfig,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(index: &'a IndexStore, retrieval: &'a RetrievalConfig) -> Self {
        Self { index, retrieval }
    }

    /// Assemble context text for a set of documents.
    ///
    /// Queries the first few documents, merges and deduplicates their
    /// chunks, and renders them with page tags. When retrieval produces
    /// nothing at all, the leading slice of the raw document text is used
    /// instead; this path never fails.
    pub async fn build(
        &self,
        document_ids: &[String],
        query: &str,
        embedder: &dyn EmbeddingProvider,
        fallback_text: &str,
    ) -> String {
        let mut merged = Vec::new();

        // Cap the number of documents queried to bound latency
        for document_id in document_ids.iter().take(self.retrieval.max_documents) {
            tracing::debug!("Retrieving context for document {}", document_id);
            let chunks = self
                .index
                .retrieve_context(document_id, query, embedder, &[], self.retrieval.top_k)
                .await;
            merged.extend(chunks);
        }

        let kept = dedup_chunks(merged, self.retrieval.max_chunks);

        if kept.is_empty() {
            tracing::warn!("Retrieval returned no results, falling back to truncated text");
            return truncate_chars(fallback_text, self.retrieval.fallback_chars).to_string();
        }

        render_chunks(&kept)
    }
}

/// Drop exact duplicate (page, content) pairs, keeping merge order, and cap
/// the result length
pub fn dedup_chunks(chunks: Vec<RetrievedChunk>, max: usize) -> Vec<RetrievedChunk> {
    let mut seen = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| seen.insert((chunk.page, chunk.content.clone())))
        .take(max)
        .collect()
}

/// Render chunks as `[Page <n>]: <content>` blocks separated by blank lines
pub fn render_chunks(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("[Page {}]: {}", chunk.page, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First `max` characters of a string, respecting char boundaries
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
