// Telegram update payloads and their conversion into domain events.
//
// Only the fields the moderation pipeline reads are modelled; everything else
// in the Bot API payload is ignored.

use crate::core::moderation::{ChatUser, ForwardOrigin, MessageEvent, MessageKind};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
    pub forward_origin: Option<MessageOrigin>,
    #[serde(default)]
    pub new_chat_members: Vec<User>,
    pub left_chat_member: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOrigin {
    User {
        sender_user: User,
    },
    HiddenUser,
    Chat {
        sender_chat: Chat,
    },
    Channel {
        chat: Chat,
    },
}

impl From<User> for ChatUser {
    fn from(user: User) -> Self {
        ChatUser {
            id: user.id,
            first_name: user.first_name,
            username: user.username,
        }
    }
}

impl From<MessageOrigin> for ForwardOrigin {
    fn from(origin: MessageOrigin) -> Self {
        match origin {
            MessageOrigin::User { sender_user } => ForwardOrigin::User {
                user_id: sender_user.id,
            },
            MessageOrigin::HiddenUser => ForwardOrigin::HiddenUser,
            MessageOrigin::Chat { sender_chat } => ForwardOrigin::Chat {
                chat_id: sender_chat.id,
            },
            MessageOrigin::Channel { chat } => ForwardOrigin::Channel { chat_id: chat.id },
        }
    }
}

impl Message {
    /// Normalize into a `MessageEvent`. Messages without a human sender
    /// (anonymous channel posts, other bots) yield `None`.
    pub fn into_event(self) -> Option<MessageEvent> {
        if self.from.as_ref().map_or(true, |u| u.is_bot) {
            return None;
        }
        self.into_any_event()
    }

    /// Like `into_event` but keeps bot senders; replied-to messages use this.
    fn into_any_event(self) -> Option<MessageEvent> {
        let sender: ChatUser = self.from?.into();

        let kind = if !self.new_chat_members.is_empty() {
            MessageKind::MembersJoined(self.new_chat_members.into_iter().map(Into::into).collect())
        } else if let Some(left) = self.left_chat_member {
            MessageKind::MemberLeft(left.into())
        } else {
            MessageKind::Regular
        };

        Some(MessageEvent {
            message_id: self.message_id,
            chat_id: self.chat.id,
            chat_title: self.chat.title,
            sender,
            text: self.text,
            caption: self.caption,
            reply_to: self
                .reply_to_message
                .and_then(|m| m.into_any_event())
                .map(Box::new),
            forward_origin: self.forward_origin.map(Into::into),
            kind,
        })
    }
}
