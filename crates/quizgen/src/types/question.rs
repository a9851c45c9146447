//! Normalized quiz question schema

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A quiz question in its final, normalized form.
///
/// Ids are assigned sequentially from 1 on every generation and are not
/// stable across regenerations. Page-citation markers have been stripped
/// from `content` and `options` but are preserved in `explanation`;
/// the cited page numbers from all three are merged into `related_pages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Sequence number, starting at 1
    pub id: u32,
    /// Question type key as produced by the model (e.g. `multiple_choice`)
    #[serde(rename = "type")]
    pub question_type: String,
    /// Question stem, citation markers removed
    pub content: String,
    /// Answer options for choice questions, citation markers removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Correct answer; models emit strings, booleans, or indexes here,
    /// so the value is passed through as-is
    #[serde(default)]
    pub correct_answer: Value,
    /// Explanation text with citation markers left in place
    #[serde(default)]
    pub explanation: String,
    /// Cited page numbers, ascending, deduplicated
    pub related_pages: Vec<u32>,
    /// Always null on creation; the caller records answers client-side
    pub user_answer: Option<String>,
}
