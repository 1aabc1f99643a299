//! Wire format shared by OpenAI-compatible chat completion endpoints.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::ProviderError;

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: String) -> Self {
        Self { role: "user".to_string(), content }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// POST a chat completion and return the first choice's text.
pub(crate) async fn send_chat(
    http: &Client,
    url: &str,
    api_key: &str,
    request: &ChatRequest<'_>,
) -> Result<String, ProviderError> {
    debug!(url, model = request.model, "Sending chat completion request");
    let response = http
        .post(url)
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP request failed");
            ProviderError::Http(e.to_string())
        })?;

    let status = response.status();
    debug!(status = %status, "Received chat completion response");

    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!("Rate limit exceeded");
        return Err(ProviderError::RateLimit);
    }
    if status == StatusCode::UNAUTHORIZED {
        error!("Authentication failed");
        return Err(ProviderError::Authentication);
    }
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %error_text, "API error");
        return Err(ProviderError::Api(error_text));
    }

    let parsed: ChatResponse = response.json().await.map_err(|e| {
        error!(error = %e, "Failed to parse chat completion JSON");
        ProviderError::Http(e.to_string())
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            error!("No choices in response");
            ProviderError::Api("No choices in response".to_string())
        })
}

/// Build the HTTP client, honoring an optional request timeout.
pub(crate) fn http_client(timeout: Option<std::time::Duration>) -> Client {
    let builder = Client::builder();
    let builder = match timeout {
        Some(t) => builder.timeout(t),
        None => builder,
    };
    builder.build().unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to default HTTP client");
        Client::new()
    })
}
