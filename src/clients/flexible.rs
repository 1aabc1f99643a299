use std::env;
use std::fmt;

use async_trait::async_trait;
use clap::ValueEnum;
use tracing::info;

use super::deepseek::{DeepSeekClient, DeepSeekConfig};
use super::groq::{GroqClient, GroqConfig};
use super::mock::MockClient;
use crate::config::{KeyFromEnv, Settings};
use crate::core::LowLevelClient;
use crate::error::{AIError, ConfigError};

/// Which provider backs the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClientType {
    Groq,
    #[value(name = "deepseek")]
    DeepSeek,
    /// Canned offline questions, no API calls
    Mock,
}

impl ClientType {
    /// Parse client type from string (case insensitive)
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "deepseek" => Ok(Self::DeepSeek),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown client type: '{}'. Supported: groq, deepseek, mock", s)),
        }
    }

    /// Pick a provider from the API keys on hand. Groq is the default, so a
    /// missing key is asked for rather than silently replaced by the mock.
    pub fn detect() -> Self {
        let _ = dotenvy::dotenv();
        Self::detect_with(|name| env::var(name).map_or(false, |v| !v.trim().is_empty()))
    }

    fn detect_with(has_key: impl Fn(&str) -> bool) -> Self {
        if !has_key(GroqClient::KEY_NAME) && has_key(DeepSeekClient::KEY_NAME) {
            Self::DeepSeek
        } else {
            Self::Groq
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientType::Groq => write!(f, "Groq"),
            ClientType::DeepSeek => write!(f, "DeepSeek"),
            ClientType::Mock => write!(f, "Mock"),
        }
    }
}

/// Provider chosen at startup, behind one concrete type
#[derive(Debug, Clone)]
pub struct FlexibleClient {
    inner: Box<dyn LowLevelClient>,
}

impl FlexibleClient {
    /// Create a new FlexibleClient wrapping the given client
    pub fn new(client: Box<dyn LowLevelClient>) -> Self {
        Self { inner: client }
    }

    /// Build the client named by the settings (or detected from the
    /// environment), applying model and timeout overrides.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let client_type = settings.client.unwrap_or_else(ClientType::detect);
        info!(client = %client_type, "Creating client");

        let client: Box<dyn LowLevelClient> = match client_type {
            ClientType::Groq => {
                let mut config = GroqConfig {
                    request_timeout: settings.request_timeout,
                    ..GroqConfig::default()
                };
                if let Some(model) = &settings.model {
                    config.model = model.clone().into();
                }
                Box::new(GroqClient::from_env(config)?)
            }
            ClientType::DeepSeek => {
                let mut config = DeepSeekConfig {
                    request_timeout: settings.request_timeout,
                    ..DeepSeekConfig::default()
                };
                if let Some(model) = &settings.model {
                    config.model = model.clone().into();
                }
                Box::new(DeepSeekClient::from_env(config)?)
            }
            ClientType::Mock => Box::new(MockClient::offline().0),
        };

        Ok(Self::new(client))
    }
}

#[async_trait]
impl LowLevelClient for FlexibleClient {
    async fn ask_raw(&self, prompt: String) -> Result<String, AIError> {
        self.inner.ask_raw(prompt).await
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mock::MockResponse;

    #[test]
    fn client_type_parsing() {
        assert_eq!(ClientType::from_str("groq"), Ok(ClientType::Groq));
        assert_eq!(ClientType::from_str("DeepSeek"), Ok(ClientType::DeepSeek));
        assert_eq!(ClientType::from_str("MOCK"), Ok(ClientType::Mock));
        assert!(ClientType::from_str("claude").is_err());
    }

    #[tokio::test]
    async fn mock_settings_build_an_offline_client() {
        let settings = Settings {
            client: Some(ClientType::Mock),
            ..Settings::default()
        };
        let client = FlexibleClient::from_settings(&settings).unwrap();
        let reply = client.ask_raw("a multiple-choice question".into()).await.unwrap();
        assert!(reply.contains("correct_answer"));
    }

    #[test]
    fn detection_never_falls_back_to_mock() {
        assert_eq!(ClientType::detect_with(|_| false), ClientType::Groq);
        assert_eq!(ClientType::detect_with(|k| k == "DEEPSEEK_API_KEY"), ClientType::DeepSeek);
        assert_eq!(ClientType::detect_with(|k| k == "GROQ_API_KEY"), ClientType::Groq);
        assert_eq!(ClientType::detect_with(|_| true), ClientType::Groq);
    }

    #[tokio::test]
    async fn forwards_to_the_wrapped_client() {
        let (mock, handle) = MockClient::with_responses(vec![MockResponse::Success("a".into())]);
        let client = FlexibleClient::new(Box::new(mock));
        assert_eq!(client.clone().ask_raw("p".into()).await.unwrap(), "a");
        assert_eq!(handle.prompts(), vec!["p"]);
    }
}
