//! File-backed prompt template store with fallback resolution

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::Result;

/// Template key every other key falls back to
pub const DEFAULT_TYPE: &str = "default";

/// Question-type keys mapped to their template file names.
///
/// Unknown keys alias to the `default` slot.
const PROMPT_FILES: &[(&str, &str)] = &[
    ("default", "prompt_template.txt"),
    ("multiple_choice", "prompt_multiple_choice.txt"),
    ("true_false", "prompt_true_false.txt"),
    ("short_answer", "prompt_short_answer.txt"),
];

/// Template used when no `default` file has been saved yet
pub const BUILT_IN_DEFAULT: &str = r#"${persona_intro}

Create ${quantity} ${type} questions based strictly on the reference context below.

Reference context:
${context}

Requirements:
- Every question must be answerable from the reference context alone.
- Cite the supporting pages in each explanation using the form [Page X].
- For choice questions, provide plausible distractors drawn from the same material.
"#;

/// Prompt template store backed by flat text files
pub struct PromptStore {
    dir: PathBuf,
}

impl PromptStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Resolve a type key to its template file name; unknown keys map to the default slot
    fn file_for(prompt_type: &str) -> &'static str {
        PROMPT_FILES
            .iter()
            .find(|(key, _)| *key == prompt_type)
            .or_else(|| PROMPT_FILES.iter().find(|(key, _)| *key == DEFAULT_TYPE))
            .map(|(_, file)| *file)
            .unwrap_or("prompt_template.txt")
    }

    /// Fetch the template for a question type.
    ///
    /// Missing type-specific files fall back to the default template; a
    /// missing default falls back to the built-in one. Only I/O failures
    /// other than "not found" surface as errors.
    pub async fn get(&self, prompt_type: &str) -> Result<String> {
        let filename = Self::file_for(prompt_type);

        match self.read_template(filename).await? {
            Some(content) => Ok(content),
            None if filename != Self::file_for(DEFAULT_TYPE) => {
                match self.read_template(Self::file_for(DEFAULT_TYPE)).await? {
                    Some(content) => Ok(content),
                    None => Ok(BUILT_IN_DEFAULT.to_string()),
                }
            }
            None => Ok(BUILT_IN_DEFAULT.to_string()),
        }
    }

    /// Fetch all known templates keyed by type
    pub async fn get_all(&self) -> Result<HashMap<String, String>> {
        let mut templates = HashMap::new();
        for (key, _) in PROMPT_FILES {
            templates.insert((*key).to_string(), self.get(key).await?);
        }
        Ok(templates)
    }

    /// Persist a template, creating the storage directory if needed
    pub async fn save(&self, prompt_type: &str, content: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(Self::file_for(prompt_type));
        tokio::fs::write(&path, content).await?;
        tracing::info!("Saved prompt template for type '{}'", prompt_type);
        Ok(())
    }

    async fn read_template(&self, filename: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.dir.join(filename)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, PromptStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PromptStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[tokio::test]
    async fn save_then_get_round_trip() {
        let (_dir, store) = store();
        store.save("multiple_choice", "MC: ${context}").await.unwrap();
        assert_eq!(store.get("multiple_choice").await.unwrap(), "MC: ${context}");
    }

    #[tokio::test]
    async fn unknown_type_aliases_to_default() {
        let (_dir, store) = store();
        store.save("default", "the default").await.unwrap();
        assert_eq!(store.get("nonexistent_type").await.unwrap(), "the default");
        assert_eq!(
            store.get("nonexistent_type").await.unwrap(),
            store.get("default").await.unwrap()
        );
    }

    #[tokio::test]
    async fn missing_type_falls_back_to_default_file() {
        let (_dir, store) = store();
        store.save("default", "fallback body").await.unwrap();
        assert_eq!(store.get("true_false").await.unwrap(), "fallback body");
    }

    #[tokio::test]
    async fn missing_default_falls_back_to_built_in() {
        let (_dir, store) = store();
        let template = store.get("default").await.unwrap();
        assert_eq!(template, BUILT_IN_DEFAULT);
        assert!(template.contains("${context}"));
        assert!(template.contains("${quantity}"));
    }

    #[tokio::test]
    async fn get_all_returns_every_known_type() {
        let (_dir, store) = store();
        let all = store.get_all().await.unwrap();
        for key in ["default", "multiple_choice", "true_false", "short_answer"] {
            assert!(all.contains_key(key), "missing template for {}", key);
        }
    }

    #[tokio::test]
    async fn save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = PromptStore::new(nested);
        store.save("default", "x").await.unwrap();
        assert_eq!(store.get("default").await.unwrap(), "x");
    }
}
