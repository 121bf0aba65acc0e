use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

use crate::providers::{Embedder, LanguageModel};

#[derive(Clone)]
pub struct OpenAI {
    client: Arc<Client<OpenAIConfig>>,
    embedding_model: String,
    chat_model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAI {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        api_key: &str,
        embedding_model: &str,
        chat_model: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            client: Arc::new(
                Client::with_config(OpenAIConfig::new().with_api_key(api_key))
                    .with_http_client(http),
            ),
            embedding_model: embedding_model.to_string(),
            chat_model: chat_model.to_string(),
            max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl Embedder for OpenAI {
    /// Embeds a string into a vector of points.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_model)
            .input(text)
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        first_embedding(response.data.into_iter().map(|data| data.embedding))
    }
}

#[async_trait]
impl LanguageModel for OpenAI {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?
            .into();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .messages(vec![message])
            .build()?;

        let response = self.client.chat().create(request).await?;

        first_completion(response.choices.into_iter().map(|choice| choice.message.content))
    }

    fn model(&self) -> &str {
        &self.chat_model
    }
}

fn first_embedding(embeddings: impl IntoIterator<Item = Vec<f32>>) -> Result<Vec<f32>> {
    embeddings
        .into_iter()
        .next()
        .filter(|embedding| !embedding.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Could not find embedding"))
}

fn first_completion(contents: impl IntoIterator<Item = Option<String>>) -> Result<String> {
    contents
        .into_iter()
        .next()
        .flatten()
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("Could not find completion"))
}
