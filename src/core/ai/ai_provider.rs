use super::models::{AiConfig, AiMessage};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Completion API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse completion response: {0}")]
    Parse(String),
}

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request and returns the text of the first choice.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, AiError>;
}

// Blanket implementation for Box<dyn AiProvider> so the classifier can hold
// whichever provider the composition root picked.
#[async_trait]
impl AiProvider for Box<dyn AiProvider> {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, AiError> {
        (**self).chat_complete(messages, config).await
    }
}
