//! Narrow interfaces over the hosted services the pipeline talks to.

use anyhow::Result;
use async_trait::async_trait;

use crate::query::RetrievedDocument;

/// Turns text into a vector with a remote embedding model.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A remote vector index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns at most `k` documents similar to `query`, most similar first.
    async fn search(
        &self,
        query: &str,
        k: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<RetrievedDocument>>;
}

/// A remote chat model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
