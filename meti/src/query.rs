use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    prompt::PromptKind,
};

pub const MIN_K: usize = 1;
pub const MAX_K: usize = 10;
pub const DEFAULT_K: usize = 5;

/// A validated question, ready to be sent through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    question: String,
    prompt_kind: PromptKind,
    k: usize,
}

impl Query {
    /// Validates the inputs of a query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if the question is blank or `k` is outside `1..=10`.
    pub fn new(question: &str, prompt_kind: PromptKind, k: usize) -> Result<Self> {
        let question = question.trim();

        if question.is_empty() {
            return Err(Error::InvalidQuery("Please enter a question.".to_string()));
        }

        if !(MIN_K..=MAX_K).contains(&k) {
            return Err(Error::InvalidQuery(format!(
                "The number of documents to retrieve must be between {MIN_K} and {MAX_K}, got {k}."
            )));
        }

        Ok(Self {
            question: question.to_string(),
            prompt_kind,
            k,
        })
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub const fn prompt_kind(&self) -> PromptKind {
        self.prompt_kind
    }

    #[must_use]
    pub const fn k(&self) -> usize {
        self.k
    }
}

/// A chunk returned by the vector index.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RetrievedDocument {
    pub content: String,
    pub metadata: Map<String, Value>,
    pub score: f32,
}

impl RetrievedDocument {
    /// The first `max_chars` characters of the content, with an ellipsis when truncated.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let preview: String = chars.by_ref().take(max_chars).collect();

        if chars.next().is_some() {
            format!("{preview}...")
        } else {
            preview
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<RetrievedDocument>,
}
