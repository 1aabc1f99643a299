use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::core::LowLevelClient;
use crate::error::AIError;

/// A scripted reply for [`MockClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    Success(String),
    Failure(String),
}

/// Shared control surface for a [`MockClient`]: queue replies, inspect calls.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    prompts: Mutex<Vec<String>>,
    offline: bool,
}

impl MockHandle {
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Number of `ask_raw` calls made so far
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Every prompt received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

/// Mock client for tests and offline runs.
///
/// Replies come from the queue on its [`MockHandle`]. An empty queue is an
/// error, except in offline mode where a canned question matching the prompt
/// is returned.
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        Self::with_responses(Vec::new())
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        });
        (Self { handle: handle.clone() }, handle)
    }

    /// A mock that never runs dry, for trying the quiz without an API key
    pub fn offline() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle {
            offline: true,
            ..Default::default()
        });
        (Self { handle: handle.clone() }, handle)
    }
}

fn canned_response(prompt: &str, n: usize) -> String {
    if prompt.contains("multiple-choice") {
        serde_json::json!({
            "question": format!("Sample question {n}: which option is correct?"),
            "options": ["Option A", "Option B", "Option C", "Option D"],
            "correct_answer": "Option A",
        })
        .to_string()
    } else {
        serde_json::json!({
            "question": format!("Sample question {n}: the answer is __."),
            "correct_answer": "sample",
        })
        .to_string()
    }
}

#[async_trait]
impl LowLevelClient for MockClient {
    async fn ask_raw(&self, prompt: String) -> Result<String, AIError> {
        let call = {
            let mut prompts = self.handle.prompts.lock().unwrap();
            prompts.push(prompt.clone());
            prompts.len()
        };
        debug!(call, "Mock client received prompt");

        let next = self.handle.responses.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Success(text)) => Ok(text),
            Some(MockResponse::Failure(message)) => Err(AIError::Mock(message)),
            None if self.handle.offline => Ok(canned_response(&prompt, call)),
            None => Err(AIError::Mock("No mock responses queued".to_string())),
        }
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }
}
