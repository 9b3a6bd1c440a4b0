// Moderation actions port - what the pipeline asks the chat platform to do.
//
// `RetryingActions` wraps any implementation with the bounded retry policy:
// transport hiccups are retried, platform refusals are not.

use crate::core::moderation::SentMessage;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const ACTION_ATTEMPTS: u32 = 3;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// Network failure, timeout, 5xx or unreadable body
    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform understood and refused the request (e.g. missing rights)
    #[error("Rejected by platform: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ModerationActions: Send + Sync {
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), ActionError>;

    /// Revoke the member's permission to send messages.
    async fn restrict_member(&self, chat_id: i64, user_id: i64) -> Result<(), ActionError>;

    async fn ban_member(&self, chat_id: i64, user_id: i64) -> Result<(), ActionError>;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<SentMessage, ActionError>;

    async fn react_to_message(
        &self,
        chat_id: i64,
        message_id: i64,
        marker: &str,
    ) -> Result<(), ActionError>;

    /// Display name of a chat.
    async fn get_chat_title(&self, chat_id: i64) -> Result<String, ActionError>;
}

// Lets the pipeline hold `Arc<dyn ModerationActions>` and still be generic-friendly.
#[async_trait]
impl<T: ModerationActions + ?Sized> ModerationActions for std::sync::Arc<T> {
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), ActionError> {
        (**self).delete_message(chat_id, message_id).await
    }

    async fn restrict_member(&self, chat_id: i64, user_id: i64) -> Result<(), ActionError> {
        (**self).restrict_member(chat_id, user_id).await
    }

    async fn ban_member(&self, chat_id: i64, user_id: i64) -> Result<(), ActionError> {
        (**self).ban_member(chat_id, user_id).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<SentMessage, ActionError> {
        (**self).send_message(chat_id, text).await
    }

    async fn react_to_message(
        &self,
        chat_id: i64,
        message_id: i64,
        marker: &str,
    ) -> Result<(), ActionError> {
        (**self).react_to_message(chat_id, message_id, marker).await
    }

    async fn get_chat_title(&self, chat_id: i64) -> Result<String, ActionError> {
        (**self).get_chat_title(chat_id).await
    }
}

/// Decorator that retries transport failures a bounded number of times.
pub struct RetryingActions<A: ModerationActions> {
    inner: A,
}

impl<A: ModerationActions> RetryingActions<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    async fn retry<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T, ActionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ActionError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(ActionError::Transport(e)) if attempt < ACTION_ATTEMPTS => {
                    tracing::warn!(attempt, "{} failed, retrying: {}", what, e);
                    tokio::time::sleep(RETRY_PAUSE).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("{} failed after {} attempt(s): {}", what, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl<A: ModerationActions> ModerationActions for RetryingActions<A> {
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), ActionError> {
        self.retry("deleteMessage", move || self.inner.delete_message(chat_id, message_id))
            .await
    }

    async fn restrict_member(&self, chat_id: i64, user_id: i64) -> Result<(), ActionError> {
        self.retry("restrictChatMember", move || {
            self.inner.restrict_member(chat_id, user_id)
        })
        .await
    }

    async fn ban_member(&self, chat_id: i64, user_id: i64) -> Result<(), ActionError> {
        self.retry("banChatMember", move || self.inner.ban_member(chat_id, user_id))
            .await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<SentMessage, ActionError> {
        self.retry("sendMessage", move || self.inner.send_message(chat_id, text))
            .await
    }

    async fn react_to_message(
        &self,
        chat_id: i64,
        message_id: i64,
        marker: &str,
    ) -> Result<(), ActionError> {
        self.retry("setMessageReaction", move || {
            self.inner.react_to_message(chat_id, message_id, marker)
        })
        .await
    }

    async fn get_chat_title(&self, chat_id: i64) -> Result<String, ActionError> {
        self.retry("getChat", move || self.inner.get_chat_title(chat_id))
            .await
    }
}

// ============================================================================
// TESTS
// ============================================================================
