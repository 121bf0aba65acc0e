use std::{sync::Arc, time::Instant};

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::{
    bedrock::Bedrock,
    config::{Config, Provider},
    error::{Error, Result},
    openai::OpenAI,
    pinecone::{Pinecone, PineconeStore},
    prompt::{build_prompt, compose_context, PromptKind},
    providers::{Embedder, LanguageModel, VectorStore},
    query::{Query, QueryResult},
};

/// Retrieval-augmented question answering over the committee documents.
///
/// Holds shared handles to the remote clients, so one instance can be built at
/// startup and used for any number of independent queries.
#[derive(Clone)]
pub struct Rag {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LanguageModel>,
    namespace: Option<String>,
}

impl Rag {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
        namespace: Option<String>,
    ) -> Self {
        Self {
            store,
            llm,
            namespace,
        }
    }

    /// Builds the remote clients described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the HTTP client cannot be built or the
    /// Pinecone index cannot be located.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let (embedder, llm): (Arc<dyn Embedder>, Arc<dyn LanguageModel>) = match config.provider {
            Provider::Bedrock => {
                let bedrock = Bedrock::new(http.clone(), &config.region, &config.provider_key);
                let embedder = bedrock.embeddings(&config.embedding_model);
                let chat = bedrock.chat(&config.chat_model, config.max_tokens, config.temperature);

                (Arc::new(embedder), Arc::new(chat))
            }
            Provider::OpenAI => {
                let openai = OpenAI::new(
                    http.clone(),
                    &config.provider_key,
                    &config.embedding_model,
                    &config.chat_model,
                    config.max_tokens,
                    config.temperature,
                );

                (Arc::new(openai.clone()), Arc::new(openai))
            }
        };

        let pinecone = Pinecone::new(http, &config.pinecone.api_key);
        let host = match &config.pinecone.index_host {
            Some(host) => host.clone(),
            None => pinecone
                .describe_index(&config.pinecone.index_name)
                .await
                .map_err(|e| Error::Configuration(format!("{e:#}")))?,
        };

        let store = PineconeStore::new(pinecone.index(&host), embedder, &config.pinecone.text_key);

        info!(
            index = %config.pinecone.index_name,
            model = %llm.model(),
            "RAG system initialized"
        );

        Ok(Self::new(Arc::new(store), llm, config.pinecone.namespace.clone()))
    }

    /// Validates the inputs and answers the question.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] before any network call when the inputs are
    /// invalid, otherwise see [`Rag::execute_query`].
    pub async fn ask(&self, question: &str, prompt_kind: PromptKind, k: usize) -> Result<QueryResult> {
        let query = Query::new(question, prompt_kind, k)?;

        self.execute_query(&query).await
    }

    /// Retrieves the `k` most relevant chunks, fills the chosen template with them
    /// and asks the model.
    ///
    /// When nothing is retrieved the model is still asked, with an empty context;
    /// both templates tell it to say the documents hold no answer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Retrieval`] if the vector store fails and
    /// [`Error::Generation`] if the model fails or answers with empty text.
    pub async fn execute_query(&self, query: &Query) -> Result<QueryResult> {
        let started = Instant::now();
        info!(
            prompt_kind = %query.prompt_kind(),
            k = query.k(),
            question_chars = query.question().chars().count(),
            "Querying committee documents"
        );

        let sources = self
            .store
            .search(query.question(), query.k(), self.namespace.as_deref())
            .await
            .map_err(Error::Retrieval)?;

        if sources.is_empty() {
            warn!("No documents retrieved, answering with an empty context");
        }

        let context = compose_context(&sources);
        let prompt = build_prompt(query.prompt_kind(), &context, query.question());
        debug!("Prompt is {} characters long", prompt.len());

        let answer = self
            .llm
            .generate(&prompt)
            .await
            .map_err(Error::Generation)?;

        if answer.trim().is_empty() {
            return Err(Error::Generation(anyhow::anyhow!(
                "{} returned an empty answer",
                self.llm.model()
            )));
        }

        info!(
            sources = sources.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Query completed"
        );

        Ok(QueryResult { answer, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RetrievedDocument;
    use async_trait::async_trait;
    use serde_json::Map;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    #[derive(Default)]
    struct FakeStore {
        documents: Vec<&'static str>,
        fail: bool,
        calls: AtomicUsize,
        namespace: Mutex<Option<String>>,
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        async fn search(
            &self,
            _query: &str,
            k: usize,
            namespace: Option<&str>,
        ) -> anyhow::Result<Vec<RetrievedDocument>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.namespace.lock().unwrap() = namespace.map(ToString::to_string);

            if self.fail {
                anyhow::bail!("index unavailable");
            }

            Ok(self
                .documents
                .iter()
                .take(k)
                .enumerate()
                .map(|(i, content)| RetrievedDocument {
                    content: (*content).to_string(),
                    metadata: Map::new(),
                    score: 1.0 - (i as f32) / 10.0,
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct FakeModel {
        answer: &'static str,
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for FakeModel {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());

            if self.fail {
                anyhow::bail!("throttled");
            }

            Ok(self.answer.to_string())
        }

        fn model(&self) -> &str {
            "fake"
        }
    }

    fn rag(store: &Arc<FakeStore>, model: &Arc<FakeModel>) -> Rag {
        Rag::new(store.clone(), model.clone(), Some("meti-2025".to_string()))
    }

    const QUESTION: &str = "What external changes are impacting Japan's electricity system?";

    #[tokio::test]
    async fn answers_with_at_most_k_sources() {
        let store = Arc::new(FakeStore {
            documents: vec!["a", "b", "c", "d", "e", "f", "g"],
            ..FakeStore::default()
        });
        let model = Arc::new(FakeModel {
            answer: "Rising demand from data centers.",
            ..FakeModel::default()
        });

        let result = rag(&store, &model)
            .ask(QUESTION, PromptKind::Comprehensive, 5)
            .await
            .unwrap();

        assert_eq!(result.answer, "Rising demand from data centers.");
        assert_eq!(result.sources.len(), 5);
        assert!(result.sources.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(store.namespace.lock().unwrap().as_deref(), Some("meti-2025"));

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(QUESTION));
        assert!(prompts[0].contains("a\n\nb\n\nc\n\nd\n\ne"));
        assert!(!prompts[0].contains("e\n\nf"));
    }

    #[tokio::test]
    async fn rejects_blank_questions_before_any_call() {
        let store = Arc::new(FakeStore::default());
        let model = Arc::new(FakeModel::default());

        let err = rag(&store, &model)
            .ask("   ", PromptKind::Simple, 5)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidQuery(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_out_of_range_k_before_any_call() {
        let store = Arc::new(FakeStore::default());
        let model = Arc::new(FakeModel::default());

        let err = rag(&store, &model)
            .ask(QUESTION, PromptKind::Simple, 11)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidQuery(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn still_asks_the_model_when_nothing_is_retrieved() {
        let store = Arc::new(FakeStore::default());
        let model = Arc::new(FakeModel {
            answer: "The provided documents do not contain information related to this question.",
            ..FakeModel::default()
        });

        let result = rag(&store, &model)
            .ask(QUESTION, PromptKind::Simple, 3)
            .await
            .unwrap();

        assert!(result.sources.is_empty());
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
        assert!(model.prompts.lock().unwrap()[0].contains("=== CONTEXT ===\n\n"));
    }

    #[tokio::test]
    async fn surfaces_retrieval_failures_without_generating() {
        let store = Arc::new(FakeStore {
            fail: true,
            ..FakeStore::default()
        });
        let model = Arc::new(FakeModel::default());

        let err = rag(&store, &model)
            .ask(QUESTION, PromptKind::Comprehensive, 5)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Retrieval(_)));
        assert!(err.to_string().contains("index unavailable"));
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn surfaces_generation_failures() {
        let store = Arc::new(FakeStore {
            documents: vec!["a"],
            ..FakeStore::default()
        });
        let failing = Arc::new(FakeModel {
            fail: true,
            ..FakeModel::default()
        });
        let silent = Arc::new(FakeModel {
            answer: "  ",
            ..FakeModel::default()
        });

        let err = rag(&store, &failing)
            .ask(QUESTION, PromptKind::Comprehensive, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));

        let err = rag(&store, &silent)
            .ask(QUESTION, PromptKind::Comprehensive, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }
}
