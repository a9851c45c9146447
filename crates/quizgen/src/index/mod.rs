//! Per-document vector indexing and retrieval

pub mod chunker;
pub mod store;

pub use chunker::TextChunker;
pub use store::{DocumentIndex, IndexStore, RetrievedChunk};
