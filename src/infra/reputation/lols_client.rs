use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::core::reputation::{ReputationError, ReputationService};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct AccountStatus {
    banned: bool,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
    url: String,
}

/// Client for a lols.bot-style reputation API.
pub struct LolsClient {
    client: Client,
    api_url: String,
    lists_url: Option<String>,
    list_name: String,
}

impl LolsClient {
    pub fn new(
        api_url: String,
        lists_url: Option<String>,
        list_name: String,
    ) -> Result<Self, ReputationError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("User-Agent", HeaderValue::from_static("tg-antispam"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReputationError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            lists_url,
            list_name,
        })
    }

    async fn get_body(&self, url: &str) -> Result<String, ReputationError> {
        tracing::debug!("Sending request to {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ReputationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReputationError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ReputationError::Request(e.to_string()))
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ReputationError> {
    serde_json::from_str(body).map_err(|e| ReputationError::Malformed(e.to_string()))
}

/// Pick the URL of the list called `name` from a list-of-lists document.
fn find_list_url(body: &str, name: &str) -> Result<String, ReputationError> {
    let entries: Vec<ListEntry> = parse(body)?;
    entries
        .into_iter()
        .find(|e| e.name == name)
        .map(|e| e.url)
        .ok_or_else(|| ReputationError::ListNotFound(name.to_string()))
}

#[async_trait]
impl ReputationService for LolsClient {
    async fn is_banned(&self, user_id: i64) -> Result<bool, ReputationError> {
        let url = format!("{}/account?id={}", self.api_url, user_id);
        let status: AccountStatus = parse(&self.get_body(&url).await?)?;
        Ok(status.banned)
    }

    async fn recent_offenders(&self) -> Result<Vec<i64>, ReputationError> {
        let Some(lists_url) = &self.lists_url else {
            return Ok(Vec::new());
        };

        let list_url = find_list_url(&self.get_body(lists_url).await?, &self.list_name)?;
        parse(&self.get_body(&list_url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_list_url() {
        let body = r#"[
            {"name": "scam", "url": "https://example.org/scam.json"},
            {"name": "spam", "url": "https://example.org/spam.json"}
        ]"#;
        assert_eq!(find_list_url(body, "spam").unwrap(), "https://example.org/spam.json");
    }

    #[test]
    fn test_find_list_url_missing_entry() {
        let body = r#"[{"name": "scam", "url": "https://example.org/scam.json"}]"#;
        assert!(matches!(
            find_list_url(body, "spam"),
            Err(ReputationError::ListNotFound(name)) if name == "spam"
        ));
    }

    #[test]
    fn test_find_list_url_malformed() {
        assert!(matches!(
            find_list_url(r#"{"lists": []}"#, "spam"),
            Err(ReputationError::Malformed(_))
        ));
    }

    #[test]
    fn test_account_status_shape() {
        let status: AccountStatus =
            serde_json::from_str(r#"{"ok": true, "user_id": 5, "banned": true}"#).unwrap();
        assert!(status.banned);
    }

    #[tokio::test]
    async fn test_no_lists_url_means_no_offenders() {
        let client = LolsClient::new("https://api.lols.bot".to_string(), None, "spam".to_string()).unwrap();
        assert!(client.recent_offenders().await.unwrap().is_empty());
    }
}
