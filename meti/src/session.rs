use chrono::{DateTime, Local};

use crate::{
    prompt::PromptKind,
    query::{Query, QueryResult, RetrievedDocument},
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, serde::Serialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
    pub sources: Vec<RetrievedDocument>,
    pub timestamp: DateTime<Local>,
    pub prompt_kind: PromptKind,
    pub k: usize,
}

impl HistoryEntry {
    #[must_use]
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Answered queries of one user, owned by whoever drives the conversation.
#[derive(Debug, Default)]
pub struct Session {
    history: Vec<HistoryEntry>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, query: &Query, result: QueryResult) -> &HistoryEntry {
        self.record_at(query, result, Local::now())
    }

    fn record_at(
        &mut self,
        query: &Query,
        result: QueryResult,
        timestamp: DateTime<Local>,
    ) -> &HistoryEntry {
        self.history.push(HistoryEntry {
            question: query.question().to_string(),
            answer: result.answer,
            sources: result.sources,
            timestamp,
            prompt_kind: query.prompt_kind(),
            k: query.k(),
        });

        &self.history[self.history.len() - 1]
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Every entry but the latest, newest first.
    pub fn previous(&self) -> impl Iterator<Item = &HistoryEntry> {
        let end = self.history.len().saturating_sub(1);

        self.history[..end].iter().rev()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
