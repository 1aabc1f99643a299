pub(crate) mod chat_completions;
pub mod deepseek;
pub mod flexible;
pub mod groq;
pub mod mock;

pub use deepseek::{DeepSeekClient, DeepSeekConfig};
pub use flexible::{ClientType, FlexibleClient};
pub use groq::{GroqClient, GroqConfig};
pub use mock::{MockClient, MockHandle, MockResponse};
