use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a query can fail. A failure at any stage discards the query.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Failed to retrieve documents: {0:#}")]
    Retrieval(#[source] anyhow::Error),

    #[error("Failed to generate an answer: {0:#}")]
    Generation(#[source] anyhow::Error),
}

impl Error {
    pub(crate) fn missing_var(name: &str) -> Self {
        Self::Configuration(format!("${name} not set"))
    }
}
