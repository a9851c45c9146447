//! PDF text extraction

use std::path::Path;

use crate::error::{Error, Result};

/// Text extracted from one PDF document
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Full document text
    pub text: String,
    /// Page count reported by the PDF, not the count of non-empty pages
    pub total_pages: u32,
    /// Per-page text, 1-indexed by position
    pub pages: Vec<String>,
}

/// Extract text from in-memory PDF bytes.
///
/// Tries page-by-page extraction first so retrieval can attribute chunks to
/// pages; if that fails, falls back to whole-document extraction with the
/// page count read separately, leaving a single synthetic page.
pub fn extract(data: &[u8]) -> Result<ExtractedDocument> {
    let pages = match pdf_extract::extract_text_from_mem_by_pages(data) {
        Ok(pages) => pages.iter().map(|p| clean_text(p)).collect::<Vec<_>>(),
        Err(e) => {
            tracing::warn!("Page-level PDF extraction failed: {}, trying whole document", e);
            let text = pdf_extract::extract_text_from_mem(data)
                .map_err(|e| Error::Extraction(e.to_string()))?;
            vec![clean_text(&text)]
        }
    };

    let text = pages
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return Err(Error::Extraction(
            "No text content could be extracted".to_string(),
        ));
    }

    let total_pages = count_pages(data).unwrap_or(pages.len() as u32);

    Ok(ExtractedDocument {
        text,
        total_pages,
        pages,
    })
}

/// Extract text from a PDF on disk, off the async runtime.
pub async fn extract_file(path: &Path) -> Result<ExtractedDocument> {
    let data = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || extract(&data))
        .await
        .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
}

/// Page count via lopdf; extraction libraries disagree on blank pages
fn count_pages(data: &[u8]) -> Option<u32> {
    lopdf::Document::load_mem(data)
        .ok()
        .map(|doc| doc.get_pages().len() as u32)
}

/// Strip NULs and collapse whitespace-only lines out of extracted text
fn clean_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_nulls_and_blank_lines() {
        let input = "First line\0\n   \n\n  Second line  \n";
        assert_eq!(clean_text(input), "First line\nSecond line");
    }

    #[test]
    fn extract_rejects_non_pdf_bytes() {
        assert!(extract(b"this is not a pdf").is_err());
    }
}
