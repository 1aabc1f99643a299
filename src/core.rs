//! Client abstraction shared by every model provider.
//!
//! Implementors provide `ask_raw`, which executes a prompt and returns the raw
//! model text. Prompt formatting, JSON extraction and retries live in
//! [`crate::generator`].

use crate::error::AIError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Low-level model client abstraction.
#[async_trait]
pub trait LowLevelClient: Send + Sync + Debug {
    /// The only method that implementations must provide
    async fn ask_raw(&self, prompt: String) -> Result<String, AIError>;

    /// Clone this client into a boxed trait object
    fn clone_box(&self) -> Box<dyn LowLevelClient>;
}

impl Clone for Box<dyn LowLevelClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl LowLevelClient for Box<dyn LowLevelClient> {
    async fn ask_raw(&self, prompt: String) -> Result<String, AIError> {
        self.as_ref().ask_raw(prompt).await
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        self.as_ref().clone_box()
    }
}
