use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::core::admin::{AdminRoster, RosterError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiMember {
    #[serde(rename = "telegramMetadata")]
    telegram_metadata: Option<TelegramMetadata>,
}

#[derive(Debug, Deserialize)]
struct TelegramMetadata {
    #[serde(rename = "telegramId")]
    telegram_id: Option<serde_json::Value>,
}

/// Community membership service. Every member with a linked Telegram account
/// is an admin of every moderated chat.
pub struct MembersRoster {
    client: Client,
    members_url: String,
}

impl MembersRoster {
    pub fn new(api_url: &str, session_key: &str) -> Result<Self, RosterError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("User-Agent", HeaderValue::from_static("tg-antispam"));
        headers.insert(
            "Cookie",
            HeaderValue::from_str(&format!("session={}", session_key))
                .map_err(|e| RosterError::Request(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RosterError::Request(e.to_string()))?;

        Ok(Self {
            client,
            members_url: format!("{}/api/members", api_url.trim_end_matches('/')),
        })
    }
}

/// Telegram ids are sent either as numbers or as numeric strings.
fn parse_telegram_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn collect_admins(body: &str) -> Result<HashSet<i64>, RosterError> {
    let members: Vec<ApiMember> =
        serde_json::from_str(body).map_err(|e| RosterError::Malformed(e.to_string()))?;
    Ok(members
        .iter()
        .filter_map(|m| m.telegram_metadata.as_ref())
        .filter_map(|t| t.telegram_id.as_ref())
        .filter_map(parse_telegram_id)
        .collect())
}

#[async_trait]
impl AdminRoster for MembersRoster {
    async fn fetch_admins(&self, _chat_id: i64) -> Result<HashSet<i64>, RosterError> {
        let response = self
            .client
            .get(&self.members_url)
            .send()
            .await
            .map_err(|e| RosterError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Members API returned {}, body: {}", status, body);
            return Err(RosterError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RosterError::Request(e.to_string()))?;
        collect_admins(&body)
    }
}
