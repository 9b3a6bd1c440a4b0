// Telegram Bot API client.
//
// Every method is a POST to `{api}/bot{token}/{method}` answering with
// `{ ok, result, description }`. An `ok: false` 4xx answer is a refusal;
// anything else that fails is treated as transport trouble and may be retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;

use crate::core::actions::{ActionError, ModerationActions};
use crate::core::admin::{AdminRoster, RosterError};
use crate::core::moderation::SentMessage;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i64,
    chat: ApiChatRef,
}

#[derive(Debug, Deserialize)]
struct ApiChatRef {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiChat {
    id: i64,
    title: Option<String>,
    first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChatMember {
    user: ApiUser,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: i64,
}

pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, ActionError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ActionError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ActionError> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .client
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(|e| ActionError::Transport(format!("{}: {}", method, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ActionError::Transport(format!("{}: {}", method, e)))?;

        parse_response(method, status, &body)
    }
}

fn parse_response<T: DeserializeOwned>(method: &str, status: u16, body: &str) -> Result<T, ActionError> {
    let parsed: ApiResponse<T> = serde_json::from_str(body).map_err(|e| {
        ActionError::Transport(format!("{}: unreadable response ({}): {}", method, status, e))
    })?;

    if parsed.ok {
        return parsed
            .result
            .ok_or_else(|| ActionError::Transport(format!("{}: response without result", method)));
    }

    let description = parsed
        .description
        .unwrap_or_else(|| format!("status {}", status));
    if (400..500).contains(&status) && status != 429 {
        Err(ActionError::Rejected(description))
    } else {
        Err(ActionError::Transport(format!("{}: {}", method, description)))
    }
}

#[async_trait]
impl ModerationActions for TelegramClient {
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), ActionError> {
        self.call::<bool>(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
        .map(|_| ())
    }

    async fn restrict_member(&self, chat_id: i64, user_id: i64) -> Result<(), ActionError> {
        self.call::<bool>(
            "restrictChatMember",
            json!({
                "chat_id": chat_id,
                "user_id": user_id,
                "permissions": { "can_send_messages": false },
            }),
        )
        .await
        .map(|_| ())
    }

    async fn ban_member(&self, chat_id: i64, user_id: i64) -> Result<(), ActionError> {
        self.call::<bool>(
            "banChatMember",
            json!({ "chat_id": chat_id, "user_id": user_id }),
        )
        .await
        .map(|_| ())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<SentMessage, ActionError> {
        let message: ApiMessage = self
            .call(
                "sendMessage",
                json!({ "chat_id": chat_id, "text": text, "parse_mode": "Markdown" }),
            )
            .await?;
        Ok(SentMessage {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn react_to_message(
        &self,
        chat_id: i64,
        message_id: i64,
        marker: &str,
    ) -> Result<(), ActionError> {
        self.call::<bool>(
            "setMessageReaction",
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "reaction": [{ "type": "emoji", "emoji": marker }],
            }),
        )
        .await
        .map(|_| ())
    }

    async fn get_chat_title(&self, chat_id: i64) -> Result<String, ActionError> {
        let chat: ApiChat = self.call("getChat", json!({ "chat_id": chat_id })).await?;
        Ok(chat
            .title
            .or(chat.first_name)
            .unwrap_or_else(|| chat.id.to_string()))
    }
}

/// Admin roster backed by `getChatAdministrators`.
#[async_trait]
impl AdminRoster for TelegramClient {
    async fn fetch_admins(&self, chat_id: i64) -> Result<HashSet<i64>, RosterError> {
        let members: Vec<ApiChatMember> = self
            .call("getChatAdministrators", json!({ "chat_id": chat_id }))
            .await
            .map_err(|e| RosterError::Request(e.to_string()))?;
        Ok(members.into_iter().map(|m| m.user.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_send_message_response() {
        let body = r#"{"ok":true,"result":{"message_id":77,"chat":{"id":-1001,"type":"supergroup"},"text":"hi"}}"#;
        let message: ApiMessage = parse_response("sendMessage", 200, body).unwrap();
        assert_eq!(message.message_id, 77);
        assert_eq!(message.chat.id, -1001);
    }

    #[test]
    fn test_client_error_is_rejection() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: not enough rights to restrict/unrestrict chat member"}"#;
        let result: Result<bool, _> = parse_response("restrictChatMember", 400, body);
        assert!(matches!(result, Err(ActionError::Rejected(d)) if d.contains("not enough rights")));
    }

    #[test]
    fn test_server_error_and_rate_limit_are_transport() {
        let body = r#"{"ok":false,"error_code":502,"description":"Bad Gateway"}"#;
        let result: Result<bool, _> = parse_response("banChatMember", 502, body);
        assert!(matches!(result, Err(ActionError::Transport(_))));

        let body = r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 3"}"#;
        let result: Result<bool, _> = parse_response("banChatMember", 429, body);
        assert!(matches!(result, Err(ActionError::Transport(_))));
    }

    #[test]
    fn test_unreadable_body_is_transport() {
        let result: Result<bool, _> = parse_response("deleteMessage", 504, "<html>Gateway Timeout</html>");
        assert!(matches!(result, Err(ActionError::Transport(_))));
    }

    #[test]
    fn test_chat_administrators_shape() {
        let body = r#"{"ok":true,"result":[
            {"status":"creator","user":{"id":1,"is_bot":false,"first_name":"Owner"}},
            {"status":"administrator","user":{"id":2,"is_bot":true,"first_name":"Bot"}}
        ]}"#;
        let members: Vec<ApiChatMember> = parse_response("getChatAdministrators", 200, body).unwrap();
        let ids: HashSet<i64> = members.into_iter().map(|m| m.user.id).collect();
        assert_eq!(ids, HashSet::from([1, 2]));
    }
}
