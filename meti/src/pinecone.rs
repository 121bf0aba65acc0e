use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    providers::{Embedder, VectorStore},
    query::RetrievedDocument,
};

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

/// Pinecone control plane, used to locate an index's data plane host.
pub struct Pinecone {
    client: Client,
    api_key: String,
}

impl Pinecone {
    #[must_use]
    pub fn new(client: Client, api_key: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
        }
    }

    /// Looks up the data plane host of an index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index does not exist or the Pinecone API is unreachable.
    pub async fn describe_index(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{CONTROL_PLANE_URL}/indexes/{name}"))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await?;

        let description: IndexDescription = check_status(response)
            .await
            .with_context(|| format!("Failed to describe Pinecone index '{name}'"))?
            .json()
            .await?;

        debug!("Resolved Pinecone index {name} to {}", description.host);

        Ok(description.host)
    }

    #[must_use]
    pub fn index(self, host: &str) -> Index {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        Index {
            client: self.client,
            api_key: self.api_key,
            base_url,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ScoredVector {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, serde::Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

/// Data plane of a single Pinecone index.
pub struct Index {
    client: Client,
    api_key: String,
    base_url: String,
}

impl Index {
    /// Finds the `count` vectors nearest to `vector`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Pinecone API rejects the request or returns an unexpected body.
    pub async fn query(
        &self,
        vector: Vec<f32>,
        count: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<ScoredVector>> {
        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&query_body(vector, count, namespace))
            .send()
            .await?;

        let response: QueryResponse = check_status(response)
            .await
            .context("Pinecone query failed")?
            .json()
            .await
            .context("Unexpected Pinecone query response")?;

        Ok(response.matches)
    }
}

fn query_body(vector: Vec<f32>, count: usize, namespace: Option<&str>) -> Value {
    let mut body = serde_json::json!({
        "vector": vector,
        "topK": count,
        "includeMetadata": true,
        "includeValues": false,
    });

    if let Some(namespace) = namespace {
        body["namespace"] = Value::from(namespace);
    }

    body
}

/// Like [`Response::error_for_status`], but keeps Pinecone's error message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    anyhow::bail!("Pinecone responded with {status}: {message}")
}

/// A [`VectorStore`] over a Pinecone index whose metadata carries the chunk text.
pub struct PineconeStore {
    index: Index,
    embedder: Arc<dyn Embedder>,
    text_key: String,
}

impl PineconeStore {
    #[must_use]
    pub fn new(index: Index, embedder: Arc<dyn Embedder>, text_key: &str) -> Self {
        Self {
            index,
            embedder,
            text_key: text_key.to_string(),
        }
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn search(
        &self,
        query: &str,
        k: usize,
        namespace: Option<&str>,
    ) -> Result<Vec<RetrievedDocument>> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed the question")?;

        let matches = self.index.query(vector, k, namespace).await?;
        debug!("Pinecone returned {} matches", matches.len());

        Ok(into_documents(matches, &self.text_key, k))
    }
}

/// Converts raw matches into documents, most similar first, keeping at most `k`.
///
/// The text is moved out of the metadata; matches without it are skipped.
fn into_documents(matches: Vec<ScoredVector>, text_key: &str, k: usize) -> Vec<RetrievedDocument> {
    let mut documents: Vec<RetrievedDocument> = matches
        .into_iter()
        .filter_map(|m| {
            let mut metadata = m.metadata.unwrap_or_default();

            let Some(Value::String(content)) = metadata.remove(text_key) else {
                warn!("Found document {} with no `{text_key}` key, skipping", m.id);
                return None;
            };

            Some(RetrievedDocument {
                content,
                metadata,
                score: m.score,
            })
        })
        .collect();

    documents.sort_by(|a, b| b.score.total_cmp(&a.score));
    documents.truncate(k);

    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matches(value: Value) -> Vec<ScoredVector> {
        serde_json::from_value::<QueryResponse>(value).unwrap().matches
    }

    #[test]
    fn moves_text_out_of_metadata() {
        let response = json!({
            "matches": [{
                "id": "a",
                "score": 0.82,
                "values": [],
                "metadata": { "text": "Grid codes were revised.", "source": "s3://meti/86.pdf", "page": 4 }
            }],
            "namespace": "meti-2025"
        });

        let docs = into_documents(matches(response), "text", 5);

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "Grid codes were revised.");
        assert_eq!(docs[0].metadata.get("source"), Some(&json!("s3://meti/86.pdf")));
        assert_eq!(docs[0].metadata.get("page"), Some(&json!(4)));
        assert!(!docs[0].metadata.contains_key("text"));
    }

    #[test]
    fn orders_by_score_and_caps_at_k() {
        let response = json!({
            "matches": [
                { "id": "low", "score": 0.1, "metadata": { "text": "low" } },
                { "id": "high", "score": 0.9, "metadata": { "text": "high" } },
                { "id": "mid", "score": 0.5, "metadata": { "text": "mid" } }
            ]
        });

        let docs = into_documents(matches(response), "text", 2);
        let contents: Vec<_> = docs.iter().map(|d| d.content.as_str()).collect();

        assert_eq!(contents, ["high", "mid"]);
    }

    #[test]
    fn skips_matches_without_text() {
        let response = json!({
            "matches": [
                { "id": "a", "score": 0.9, "metadata": { "text": "wrong key" } },
                { "id": "b", "score": 0.8 },
                { "id": "c", "score": 0.7, "metadata": { "page_content": "right key" } }
            ]
        });

        let docs = into_documents(matches(response), "page_content", 5);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "right key");
    }

    #[test]
    fn tolerates_empty_responses() {
        assert!(into_documents(matches(json!({})), "text", 5).is_empty());
    }

    #[test]
    fn builds_query_bodies() {
        let body = query_body(vec![0.5, 0.25], 3, Some("meti-2025"));

        assert_eq!(
            body,
            json!({
                "vector": [0.5, 0.25],
                "topK": 3,
                "includeMetadata": true,
                "includeValues": false,
                "namespace": "meti-2025"
            })
        );
        assert!(query_body(vec![0.5], 5, None).get("namespace").is_none());
    }

    #[tokio::test]
    async fn keeps_pinecone_error_messages() {
        let response = http::Response::builder()
            .status(404)
            .body(r#"{"error":{"code":"NOT_FOUND","message":"Resource meti-2025 not found"}}"#)
            .unwrap();

        let err = check_status(Response::from(response)).await.unwrap_err().to_string();

        assert!(err.contains("404"));
        assert!(err.contains("Resource meti-2025 not found"));
    }

    #[test]
    fn normalizes_index_hosts() {
        let pinecone = || Pinecone::new(Client::new(), "key");

        assert_eq!(
            pinecone().index("meti-abc.svc.pinecone.io").base_url,
            "https://meti-abc.svc.pinecone.io"
        );
        assert_eq!(pinecone().index("http://localhost:5081/").base_url, "http://localhost:5081");
    }
}
