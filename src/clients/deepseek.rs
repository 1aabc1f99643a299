pub mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};

use self::models::DeepSeekModel;
use super::chat_completions::{http_client, send_chat, ChatMessage, ChatRequest};
use crate::config::KeyFromEnv;
use crate::core::LowLevelClient;
use crate::error::{AIError, ConfigError};

const DEEPSEEK_CHAT_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Configuration for DeepSeek client
#[derive(Debug, Clone)]
pub struct DeepSeekConfig {
    pub api_key: String,
    pub model: DeepSeekModel,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Option<Duration>,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DeepSeekModel::default(),
            max_tokens: 1024,
            temperature: 0.7,
            request_timeout: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DeepSeekClient {
    config: DeepSeekConfig,
    http: Client,
}

impl KeyFromEnv for DeepSeekClient {
    const KEY_NAME: &'static str = "DEEPSEEK_API_KEY";
}

impl DeepSeekClient {
    pub fn new(config: DeepSeekConfig) -> Self {
        info!(model = %config.model.id(), "Creating new DeepSeek client");
        let http = http_client(config.request_timeout);
        Self { config, http }
    }

    /// Resolve the API key from env/.env, asking on the terminal as a last resort.
    pub fn from_env(mut config: DeepSeekConfig) -> Result<Self, ConfigError> {
        config.api_key = Self::find_key_with_user()?;
        Ok(Self::new(config))
    }
}

#[async_trait]
impl LowLevelClient for DeepSeekClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), model = %self.config.model.id()))]
    async fn ask_raw(&self, prompt: String) -> Result<String, AIError> {
        let request = ChatRequest {
            model: self.config.model.id(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let text = send_chat(&self.http, DEEPSEEK_CHAT_URL, &self.config.api_key, &request)
            .await
            .map_err(AIError::DeepSeek)?;
        info!(response_len = text.len(), "Successfully received DeepSeek response");
        Ok(text)
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }
}
