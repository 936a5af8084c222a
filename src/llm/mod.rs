//! Chat completion
//!
//! A single-turn chat model abstraction and the Gemini implementation.

mod gemini;

pub use gemini::*;

use crate::config::GoogleConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for chat completion providers
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one user prompt and return the model's text reply
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create a chat model based on configuration
pub fn create_chat_model(config: &GoogleConfig) -> Result<Box<dyn ChatModel>> {
    let model = GeminiChat::from_config(config)?;
    Ok(Box::new(model))
}
