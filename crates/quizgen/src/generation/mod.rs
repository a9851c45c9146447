//! Quiz generation pipeline
//!
//! One generation request flows context building, batch planning, parallel
//! LLM calls, and response normalization in that order.

pub mod context;
pub mod normalizer;
pub mod planner;

use futures::future::try_join_all;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::{GenerationConfig, RetrievalConfig};
use crate::error::Result;
use crate::index::IndexStore;
use crate::providers::{CompletionService, EmbeddingProvider};
use crate::types::{Persona, Question};

use context::ContextBuilder;
use planner::{BatchPlanner, PlanRequest};

/// Inputs of one generation run, already validated by the HTTP layer
pub struct GenerationSpec {
    pub pdf_ids: Vec<String>,
    pub types: Vec<String>,
    pub type_counts: Option<BTreeMap<String, u32>>,
    pub quantity: Option<u32>,
    pub custom_requirements: Option<String>,
    pub persona: Persona,
    /// Aggregated raw document text, used when retrieval comes up empty
    pub fallback_text: String,
}

/// Orchestrates the generation pipeline against a per-request LLM service
pub struct QuizGenerator {
    index: Arc<IndexStore>,
    retrieval: RetrievalConfig,
    generation: GenerationConfig,
}

impl QuizGenerator {
    pub fn new(
        index: Arc<IndexStore>,
        retrieval: RetrievalConfig,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            index,
            retrieval,
            generation,
        }
    }

    /// Run the full pipeline and return the normalized question list.
    ///
    /// All planned LLM calls are dispatched concurrently; a single call
    /// failing fails the whole run rather than returning a partial quiz.
    pub async fn generate(
        &self,
        spec: &GenerationSpec,
        service: &dyn CompletionService,
        embedder: &dyn EmbeddingProvider,
        templates: &HashMap<String, String>,
    ) -> Result<Vec<Question>> {
        let query = retrieval_query(&spec.types);

        let context = ContextBuilder::new(&self.index, &self.retrieval)
            .build(&spec.pdf_ids, &query, embedder, &spec.fallback_text)
            .await;

        let persona_intro = spec.persona.intro();
        let prompts = BatchPlanner::new(&self.generation).plan(&PlanRequest {
            types: &spec.types,
            type_counts: spec.type_counts.as_ref(),
            quantity: spec.quantity,
            custom_requirements: spec.custom_requirements.as_deref(),
            persona_intro: &persona_intro,
            context: &context,
            templates,
        });

        tracing::info!(
            "Dispatching {} parallel generation requests (model: {})",
            prompts.len(),
            service.model()
        );

        let responses =
            try_join_all(prompts.iter().map(|prompt| service.generate_quiz(prompt))).await?;

        let mut raw_questions = Vec::new();
        for response in &responses {
            raw_questions.extend(normalizer::parse_questions(response)?);
        }

        let questions = normalizer::post_process(raw_questions);
        tracing::info!("Generated {} questions", questions.len());
        Ok(questions)
    }

    /// Answer a follow-up question about a quiz item, with optional
    /// retrieval over the originating document.
    pub async fn chat(
        &self,
        question: &Value,
        user_query: &str,
        pdf_id: Option<&str>,
        service: &dyn CompletionService,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<String> {
        let mut rag_context = String::new();
        if let Some(pdf_id) = pdf_id {
            let chunks = self
                .index
                .retrieve_context(pdf_id, user_query, embedder, &[], self.retrieval.top_k)
                .await;
            if !chunks.is_empty() {
                rag_context = context::render_chunks(&chunks);
            }
        }

        let system_prompt = chat_system_prompt(question, &rag_context);
        service.chat(&system_prompt, user_query).await
    }
}

/// Retrieval query describing what the generated questions should cover
pub fn retrieval_query(types: &[String]) -> String {
    format!(
        "Generate {} questions covering key concepts, definitions, and important details from this document.",
        types.join(", ")
    )
}

fn chat_system_prompt(question: &Value, rag_context: &str) -> String {
    format!(
        "You are a professional AI teaching assistant.\n\
         Answer the user's question based on the quiz item and the reference context below.\n\
         Keep the answer concise and focus on the point the user is confused about.\n\n\
         Quiz item:\n{}\n\n\
         Reference context:\n{}\n",
        question,
        if rag_context.is_empty() {
            "none"
        } else {
            rag_context
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingConfig;
    use crate::error::Error;
    use async_trait::async_trait;
    use serde_json::json;

    /// Completion stub returning a fixed payload per call
    struct StubService {
        payload: String,
    }

    #[async_trait]
    impl CompletionService for StubService {
        async fn generate_quiz(&self, _prompt: &str) -> Result<String> {
            Ok(self.payload.clone())
        }

        async fn chat(&self, system_prompt: &str, _user_query: &str) -> Result<String> {
            Ok(format!("echo: {}", system_prompt))
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    struct FailingService;

    #[async_trait]
    impl CompletionService for FailingService {
        async fn generate_quiz(&self, _prompt: &str) -> Result<String> {
            Err(Error::llm("model unavailable"))
        }

        async fn chat(&self, _system_prompt: &str, _user_query: &str) -> Result<String> {
            Err(Error::llm("model unavailable"))
        }

        fn model(&self) -> &str {
            "failing-model"
        }
    }

    struct NoEmbedder;

    #[async_trait]
    impl EmbeddingProvider for NoEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::llm("no embeddings in tests"))
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    fn generator() -> (tempfile::TempDir, QuizGenerator) {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(IndexStore::new(
            dir.path().to_path_buf(),
            ChunkingConfig::default(),
        ));
        let generator = QuizGenerator::new(
            index,
            RetrievalConfig::default(),
            GenerationConfig::default(),
        );
        (dir, generator)
    }

    fn spec(type_counts: Option<BTreeMap<String, u32>>) -> GenerationSpec {
        GenerationSpec {
            pdf_ids: vec!["doc.pdf".to_string()],
            types: vec!["multiple_choice".to_string()],
            type_counts,
            quantity: None,
            custom_requirements: None,
            persona: Persona::default(),
            fallback_text: "The cell membrane regulates transport.".to_string(),
        }
    }

    fn templates() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            "default".to_string(),
            "${persona_intro} ${type} ${context} ${quantity}".to_string(),
        );
        map
    }

    #[tokio::test]
    async fn generates_sequential_questions_end_to_end() {
        let (_dir, generator) = generator();
        let service = StubService {
            payload: json!({
                "questions": [
                    {"type": "multiple_choice", "content": "Q one [Page 1]", "options": ["a", "b"], "correctAnswer": "a", "explanation": "see [Page 1]"},
                    {"type": "multiple_choice", "content": "Q two", "correctAnswer": "b", "explanation": ""},
                    {"type": "multiple_choice", "content": "Q three", "correctAnswer": "c", "explanation": ""},
                ]
            })
            .to_string(),
        };

        let mut counts = BTreeMap::new();
        counts.insert("multiple_choice".to_string(), 3u32);

        let questions = generator
            .generate(&spec(Some(counts)), &service, &NoEmbedder, &templates())
            .await
            .unwrap();

        assert_eq!(questions.len(), 3);
        assert_eq!(
            questions.iter().map(|q| q.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(questions.iter().all(|q| !q.content.is_empty()));
        assert!(questions.iter().all(|q| q.user_answer.is_none()));
        assert_eq!(questions[0].content, "Q one");
        assert_eq!(questions[0].related_pages, vec![1]);
    }

    #[tokio::test]
    async fn merges_batches_and_renumbers() {
        let (_dir, generator) = generator();
        let service = StubService {
            payload: json!({
                "questions": [
                    {"content": "a"}, {"content": "b"}, {"content": "c"},
                    {"content": "d"}, {"content": "e"},
                ]
            })
            .to_string(),
        };

        // Flat strategy, default quantity 10 -> two batches of 5
        let questions = generator
            .generate(&spec(None), &service, &NoEmbedder, &templates())
            .await
            .unwrap();

        assert_eq!(questions.len(), 10);
        assert_eq!(questions.last().unwrap().id, 10);
    }

    #[tokio::test]
    async fn single_call_failure_aborts_generation() {
        let (_dir, generator) = generator();
        let result = generator
            .generate(&spec(None), &FailingService, &NoEmbedder, &templates())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn chat_embeds_question_and_reports_missing_context() {
        let (_dir, generator) = generator();
        let service = StubService {
            payload: String::new(),
        };

        let question = json!({"content": "What is osmosis?", "correctAnswer": "x"});
        let reply = generator
            .chat(&question, "why is x right?", None, &service, &NoEmbedder)
            .await
            .unwrap();

        assert!(reply.contains("What is osmosis?"));
        assert!(reply.contains("Reference context:\nnone"));
    }

    #[test]
    fn retrieval_query_lists_types() {
        let query = retrieval_query(&["multiple_choice".to_string(), "true_false".to_string()]);
        assert!(query.starts_with("Generate multiple_choice, true_false questions"));
    }
}
