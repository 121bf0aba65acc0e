#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod bedrock;
pub mod catalog;
mod config;
mod error;
pub mod openai;
pub mod pinecone;
mod prompt;
pub mod providers;
mod query;
mod rag;
mod session;

pub use config::{Config, PineconeConfig, Provider};
pub use error::{Error, Result};
pub use prompt::{build_prompt, compose_context, PromptKind};
pub use query::{Query, QueryResult, RetrievedDocument, DEFAULT_K, MAX_K, MIN_K};
pub use rag::Rag;
pub use session::{HistoryEntry, Session, TIMESTAMP_FORMAT};
