use crate::core::ai::{
    models::{AiConfig, AiMessage},
    AiError, AiProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for any OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, proxy_url: Option<String>) -> Result<Self, AiError> {
        let mut builder = Client::builder().timeout(REQUEST_TIMEOUT);
        if let Some(proxy_url) = proxy_url.filter(|p| !p.is_empty()) {
            let proxy = reqwest::Proxy::all(&proxy_url).map_err(|e| AiError::Request(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(|e| AiError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let payload = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
            "top_p": config.top_p,
            "frequency_penalty": config.frequency_penalty,
            "presence_penalty": config.presence_penalty,
            "response_format": { "type": "text" },
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| AiError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status, body });
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        extract_content(&response_json)
    }
}

fn extract_content(response: &serde_json::Value) -> Result<String, AiError> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AiError::Parse("Failed to parse response content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_content() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Fine (spamness 3%)" } }]
        });
        assert_eq!(extract_content(&response).unwrap(), "Fine (spamness 3%)");
    }

    #[test]
    fn test_extract_content_missing_choice() {
        assert!(matches!(
            extract_content(&json!({ "choices": [] })),
            Err(AiError::Parse(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = OpenAiClient::new("key".to_string(), "https://api.openai.com/v1/".to_string(), None).unwrap();
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }
}
