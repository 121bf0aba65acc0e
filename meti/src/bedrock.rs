use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::debug;

use crate::providers::{Embedder, LanguageModel};

/// Amazon Bedrock runtime, authenticated with a Bedrock API key.
#[derive(Clone)]
pub struct Bedrock {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Bedrock {
    #[must_use]
    pub fn new(client: Client, region: &str, api_key: &str) -> Self {
        Self::with_base_url(
            client,
            format!("https://bedrock-runtime.{region}.amazonaws.com"),
            api_key,
        )
    }

    #[must_use]
    pub fn with_base_url(client: Client, base_url: String, api_key: &str) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        }
    }

    #[must_use]
    pub fn embeddings(&self, model: &str) -> BedrockEmbeddings {
        BedrockEmbeddings {
            bedrock: self.clone(),
            model: model.to_string(),
        }
    }

    #[must_use]
    pub fn chat(&self, model: &str, max_tokens: u32, temperature: f32) -> BedrockChat {
        BedrockChat {
            bedrock: self.clone(),
            model: model.to_string(),
            max_tokens,
            temperature,
        }
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        model: &str,
        action: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!(
                "{}/model/{}/{action}",
                self.base_url,
                model.replace(':', "%3A")
            ))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            anyhow::bail!("Bedrock {action} on {model} failed with {status}: {message}");
        }

        response
            .json()
            .await
            .with_context(|| format!("Unexpected Bedrock {action} response from {model}"))
    }
}

/// Titan text embeddings through `InvokeModel`.
pub struct BedrockEmbeddings {
    bedrock: Bedrock,
    model: String,
}

#[derive(Debug, serde::Deserialize)]
struct TitanEmbedding {
    embedding: Option<Vec<f32>>,
}

impl TitanEmbedding {
    fn into_vector(self) -> Result<Vec<f32>> {
        self.embedding
            .filter(|e| !e.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Could not find embedding"))
    }
}

#[async_trait]
impl Embedder for BedrockEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response: TitanEmbedding = self
            .bedrock
            .post(&self.model, "invoke", &json!({ "inputText": text }))
            .await?;

        response.into_vector()
    }
}

/// Chat models through the `Converse` API.
pub struct BedrockChat {
    bedrock: Bedrock,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, serde::Deserialize)]
struct ConverseResponse {
    output: ConverseOutput,
    #[serde(rename = "stopReason")]
    stop_reason: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ConverseOutput {
    message: Option<ConverseMessage>,
}

#[derive(Debug, serde::Deserialize)]
struct ConverseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, serde::Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl ConverseResponse {
    fn into_text(self) -> Result<String> {
        let text = self
            .output
            .message
            .map(|m| {
                m.content
                    .into_iter()
                    .filter_map(|block| block.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            anyhow::bail!(
                "Could not find completion (stop reason: {})",
                self.stop_reason.as_deref().unwrap_or("unknown")
            );
        }

        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for BedrockChat {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "messages": [{
                "role": "user",
                "content": [{ "text": prompt }],
            }],
            "inferenceConfig": {
                "maxTokens": self.max_tokens,
                "temperature": self.temperature,
            },
        });

        let response: ConverseResponse = self.bedrock.post(&self.model, "converse", &body).await?;
        debug!("Bedrock stop reason: {:?}", response.stop_reason);

        response.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}
