// Moderation domain models - data structures for the anti-spam pipeline.
//
// These are pure domain types with no Telegram dependencies.
// The Telegram layer converts raw updates into `MessageEvent`s.

use crate::core::locale::link_text;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The account that sent a message (or joined a chat).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

impl ChatUser {
    /// Markdown mention that pings the user even without a username.
    pub fn mention(&self) -> String {
        let mut name = link_text(&self.first_name);
        if name.trim().is_empty() {
            name = self.id.to_string();
        }
        format!("[{}](tg://user?id={})", name, self.id)
    }
}

/// Where a forwarded message originally came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardOrigin {
    User { user_id: i64 },
    HiddenUser,
    Chat { chat_id: i64 },
    Channel { chat_id: i64 },
}

impl ForwardOrigin {
    /// Id of the community the content was forwarded from, if it has one.
    pub fn community_id(&self) -> Option<i64> {
        match self {
            ForwardOrigin::Chat { chat_id } | ForwardOrigin::Channel { chat_id } => Some(*chat_id),
            ForwardOrigin::User { .. } | ForwardOrigin::HiddenUser => None,
        }
    }
}

/// Structural kind of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// A regular message (text, caption, media, forward...)
    Regular,
    /// Membership notice: someone joined
    MembersJoined(Vec<ChatUser>),
    /// Membership notice: someone left
    MemberLeft(ChatUser),
}

/// A normalized inbound message. Immutable once received.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub message_id: i64,
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub sender: ChatUser,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub reply_to: Option<Box<MessageEvent>>,
    pub forward_origin: Option<ForwardOrigin>,
    pub kind: MessageKind,
}

impl MessageEvent {
    /// Text of the message, falling back to the media caption.
    pub fn content(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Membership notices are never judged by the filter chain.
    pub fn is_membership_notice(&self) -> bool {
        !matches!(self.kind, MessageKind::Regular)
    }

    /// Key for per-message transient state (message ids are only unique per chat).
    pub fn key(&self) -> MessageKey {
        MessageKey {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey {
    pub chat_id: i64,
    pub message_id: i64,
}

/// What a single filter decided about a message.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterVerdict {
    NotSpam,
    Spam { reason: String },
    /// The filter did not judge (e.g. disabled). Treated as a pass by the chain.
    Skip,
}

impl FilterVerdict {
    pub fn spam(reason: impl Into<String>) -> Self {
        FilterVerdict::Spam {
            reason: reason.into(),
        }
    }

    pub fn is_spam(&self) -> bool {
        matches!(self, FilterVerdict::Spam { .. })
    }
}

/// Handle of a message the bot sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i64,
}

/// One-shot deferred action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    DeleteMessage { chat_id: i64, message_id: i64 },
    BanMember { chat_id: i64, user_id: i64 },
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::DeleteMessage {
                chat_id,
                message_id,
            } => write!(f, "delete message {} in chat {}", message_id, chat_id),
            ActionKind::BanMember { chat_id, user_id } => {
                write!(f, "ban user {} in chat {}", user_id, chat_id)
            }
        }
    }
}

/// A deferred action as handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAction {
    pub kind: ActionKind,
    pub enqueued_at: DateTime<Utc>,
    pub delay: Duration,
}

impl ScheduledAction {
    pub fn new(kind: ActionKind, delay: Duration) -> Self {
        Self {
            kind,
            enqueued_at: Utc::now(),
            delay,
        }
    }

    /// Wall-clock time at which the action is due.
    pub fn fire_at(&self) -> DateTime<Utc> {
        self.enqueued_at
            + chrono::Duration::from_std(self.delay).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

/// Delays and markers used by the spam-response protocol.
#[derive(Debug, Clone)]
pub struct ResponsePolicy {
    /// Grace window between restriction and the permanent ban
    pub ban_delay: Duration,
    /// How long the restriction notice stays in the chat
    pub notice_delete_delay: Duration,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            ban_delay: Duration::from_secs(600),
            notice_delete_delay: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_event(chat_id: i64, message_id: i64, sender_id: i64, text: &str) -> MessageEvent {
    MessageEvent {
        message_id,
        chat_id,
        chat_title: Some("Test chat".to_string()),
        sender: ChatUser {
            id: sender_id,
            first_name: format!("user{}", sender_id),
            username: None,
        },
        text: Some(text.to_string()),
        caption: None,
        reply_to: None,
        forward_origin: None,
        kind: MessageKind::Regular,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_prefers_text_over_caption() {
        let mut event = test_event(1, 2, 3, "hello");
        event.caption = Some("caption".to_string());
        assert_eq!(event.content(), Some("hello"));

        event.text = None;
        assert_eq!(event.content(), Some("caption"));
    }

    #[test]
    fn test_mention_survives_markdown_in_names() {
        let user = ChatUser {
            id: 7,
            first_name: "john_doe".to_string(),
            username: None,
        };
        assert_eq!(user.mention(), "[johndoe](tg://user?id=7)");

        let user = ChatUser {
            first_name: "**".to_string(),
            ..user
        };
        assert_eq!(user.mention(), "[7](tg://user?id=7)");
    }

    #[test]
    fn test_forward_origin_community_id() {
        assert_eq!(
            ForwardOrigin::Channel { chat_id: -100123 }.community_id(),
            Some(-100123)
        );
        assert_eq!(ForwardOrigin::User { user_id: 5 }.community_id(), None);
        assert_eq!(ForwardOrigin::HiddenUser.community_id(), None);
    }

    #[test]
    fn test_fire_at_adds_delay() {
        let action = ScheduledAction::new(
            ActionKind::BanMember {
                chat_id: 1,
                user_id: 2,
            },
            Duration::from_secs(600),
        );
        assert_eq!(
            action.fire_at() - action.enqueued_at,
            chrono::Duration::seconds(600)
        );
    }
}
