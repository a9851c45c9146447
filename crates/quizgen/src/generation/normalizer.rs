//! Parsing and normalization of LLM quiz responses

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::types::Question;

/// Longest slice of raw output included in parse-failure messages
const PREVIEW_CHARS: usize = 500;

/// Parse one raw LLM response into its list of question objects.
///
/// Three strategies run in order: strict JSON, lenient JSON5, and a single
/// heuristic repair for an unescaped-nested-quote pattern seen in the wild.
/// The repair is a narrow patch for one observed failure mode, not a
/// general strategy; resist widening it.
pub fn parse_questions(raw: &str) -> Result<Vec<Value>> {
    let cleaned = strip_code_fences(raw);

    let parsed: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Strict JSON parse failed, trying lenient parser: {}", e);
            match json5::from_str(&cleaned) {
                Ok(value) => value,
                Err(e2) => {
                    tracing::warn!("Lenient parse also failed: {}", e2);
                    let repaired = repair_nested_quotes(&cleaned);
                    match json5::from_str(&repaired) {
                        Ok(value) => value,
                        Err(_) => {
                            return Err(Error::ParseFailure {
                                preview: preview(raw),
                            })
                        }
                    }
                }
            }
        }
    };

    Ok(extract_question_array(parsed))
}

/// Post-process the merged question lists of all batches.
///
/// Citation markers are stripped from stems and options (pages recorded),
/// left intact in explanations (pages still recorded), ids are reassigned
/// sequentially, and any answer the model pre-filled is discarded.
pub fn post_process(raw_questions: Vec<Value>) -> Vec<Question> {
    let marker = page_marker_regex();

    raw_questions
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let mut pages = BTreeSet::new();

            let content = strip_markers(
                raw.get("content").and_then(Value::as_str).unwrap_or(""),
                &marker,
                &mut pages,
            );

            let options = raw.get("options").and_then(Value::as_array).map(|opts| {
                opts.iter()
                    .map(|opt| match opt.as_str() {
                        Some(text) => strip_markers(text, &marker, &mut pages),
                        None => opt.to_string(),
                    })
                    .collect::<Vec<_>>()
            });

            let explanation = raw
                .get("explanation")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            collect_markers(&explanation, &marker, &mut pages);

            Question {
                id: (i + 1) as u32,
                question_type: raw
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
                content,
                options,
                correct_answer: raw.get("correctAnswer").cloned().unwrap_or(Value::Null),
                explanation,
                related_pages: pages.into_iter().collect(),
                user_answer: None,
            }
        })
        .collect()
}

fn page_marker_regex() -> Regex {
    Regex::new(r"(?i)\[Page\s+(\d+)\]").expect("invalid page marker regex")
}

/// Remove Markdown code-fence markers around a JSON payload
fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Rewrite `key: "text "word" more"` into `key: "text 'word' more"`.
///
/// Targets exactly one malformed pattern: an unescaped quote pair nested
/// inside a string value.
fn repair_nested_quotes(text: &str) -> String {
    let pattern = Regex::new(r#":\s*"([^"]*)"([^",]*)"([^"]*)""#).expect("invalid repair regex");
    pattern.replace_all(text, r#": "${1}'${2}'${3}""#).to_string()
}

/// Bounded, single-line preview of unparseable output
fn preview(raw: &str) -> String {
    raw.chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Locate the question list inside whatever shape the model produced
fn extract_question_array(parsed: Value) -> Vec<Value> {
    match parsed {
        Value::Array(items) => items,
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("questions") {
                return items.clone();
            }
            // Fall back to the first array-valued field, in field order
            for (_, value) in map {
                if let Value::Array(items) = value {
                    return items;
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Remove every page marker from the text, recording cited pages
fn strip_markers(text: &str, marker: &Regex, pages: &mut BTreeSet<u32>) -> String {
    let stripped = marker.replace_all(text, |caps: &regex::Captures| {
        if let Ok(page) = caps[1].parse::<u32>() {
            pages.insert(page);
        }
        String::new()
    });
    stripped.trim().to_string()
}

/// Record cited pages without altering the text
fn collect_markers(text: &str, marker: &Regex, pages: &mut BTreeSet<u32>) {
    for caps in marker.captures_iter(text) {
        if let Ok(page) = caps[1].parse::<u32>() {
            pages.insert(page);
        }
    }
}
