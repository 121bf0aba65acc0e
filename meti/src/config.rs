use std::{env, str::FromStr, time::Duration};

use crate::error::{Error, Result};

const DEFAULT_TEXT_KEY: &str = "text";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Which hosted service embeds questions and generates answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Bedrock,
    OpenAI,
}

impl Provider {
    const fn default_embedding_model(self) -> &'static str {
        match self {
            Self::Bedrock => "amazon.titan-embed-text-v2:0",
            Self::OpenAI => "text-embedding-3-small",
        }
    }

    const fn default_chat_model(self) -> &'static str {
        match self {
            Self::Bedrock => "anthropic.claude-3-haiku-20240307-v1:0",
            Self::OpenAI => "gpt-4o-mini",
        }
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bedrock" => Ok(Self::Bedrock),
            "openai" => Ok(Self::OpenAI),
            other => Err(Error::Configuration(format!(
                "$LLM_PROVIDER must be 'bedrock' or 'openai', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_name: String,
    pub index_host: Option<String>,
    pub namespace: Option<String>,
    pub text_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub region: String,
    pub pinecone: PineconeConfig,
    pub provider: Provider,
    /// Bedrock API key or OpenAI API key, depending on `provider`.
    pub provider_key: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first required variable
    /// that is missing or malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first required variable
    /// that is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| get(name).ok_or_else(|| Error::missing_var(name));

        let region = require("AWS_REGION")?;
        let pinecone = PineconeConfig {
            api_key: require("PINECONE_API_KEY")?,
            index_name: require("PINECONE_INDEX_NAME")?,
            index_host: get("PINECONE_INDEX_HOST"),
            namespace: get("PINECONE_NAMESPACE"),
            text_key: get("PINECONE_TEXT_KEY").unwrap_or_else(|| DEFAULT_TEXT_KEY.to_string()),
        };

        let provider = get("LLM_PROVIDER")
            .map(|p| p.parse::<Provider>())
            .transpose()?
            .unwrap_or_default();

        let provider_key = match provider {
            Provider::Bedrock => require("AWS_BEARER_TOKEN_BEDROCK")?,
            Provider::OpenAI => require("OPENAI_API_KEY")?,
        };

        Ok(Self {
            region,
            pinecone,
            provider,
            provider_key,
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| provider.default_embedding_model().to_string()),
            chat_model: get("CHAT_MODEL")
                .unwrap_or_else(|| provider.default_chat_model().to_string()),
            max_tokens: parse_var(&get, "MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: parse_var(&get, "TEMPERATURE")?.unwrap_or(0.0),
            request_timeout: Duration::from_secs(
                parse_var(&get, "REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }
}

fn parse_var<T: FromStr>(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>> {
    get(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Configuration(format!("${name} is not a valid value: '{raw}'")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();

        move |name: &str| map.get(name).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("AWS_REGION", "us-east-1"),
        ("PINECONE_API_KEY", "pc-key"),
        ("PINECONE_INDEX_NAME", "meti"),
        ("AWS_BEARER_TOKEN_BEDROCK", "bedrock-key"),
    ];

    #[test]
    fn loads_defaults_for_bedrock() {
        let config = Config::from_lookup(vars(BASE)).unwrap();

        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.provider, Provider::Bedrock);
        assert_eq!(config.provider_key, "bedrock-key");
        assert_eq!(config.embedding_model, "amazon.titan-embed-text-v2:0");
        assert_eq!(config.chat_model, "anthropic.claude-3-haiku-20240307-v1:0");
        assert_eq!(config.pinecone.text_key, "text");
        assert_eq!(config.pinecone.namespace, None);
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn fails_naming_the_missing_variable() {
        let err = Config::from_lookup(vars(&BASE[..2])).unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(err.to_string(), "Configuration error: $PINECONE_INDEX_NAME not set");
    }

    #[test]
    fn treats_blank_values_as_missing() {
        let mut pairs = BASE.to_vec();
        pairs[0] = ("AWS_REGION", "   ");

        let err = Config::from_lookup(vars(&pairs)).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: $AWS_REGION not set");
    }

    #[test]
    fn openai_provider_requires_its_own_key() {
        let mut pairs = BASE.to_vec();
        pairs.push(("LLM_PROVIDER", "OpenAI"));

        let err = Config::from_lookup(vars(&pairs)).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: $OPENAI_API_KEY not set");

        pairs.push(("OPENAI_API_KEY", "sk-test"));
        let config = Config::from_lookup(vars(&pairs)).unwrap();
        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.chat_model, "gpt-4o-mini");
    }

    #[test]
    fn rejects_unknown_provider_and_bad_numbers() {
        let mut pairs = BASE.to_vec();
        pairs.push(("LLM_PROVIDER", "llama"));
        assert!(Config::from_lookup(vars(&pairs)).is_err());

        let mut pairs = BASE.to_vec();
        pairs.push(("MAX_TOKENS", "lots"));
        let err = Config::from_lookup(vars(&pairs)).unwrap_err();
        assert!(err.to_string().contains("$MAX_TOKENS"));
    }
}
