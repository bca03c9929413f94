use crate::config::{Config, DEFAULT_GROQ_BASE_URL, DEFAULT_GROQ_MODEL};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Text-completion provider. One call, no retries; callers treat any error as "no usable output".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&Config> for LlmSettings {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.groq_base_url.clone(),
            model: config.groq_model.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
            ..Self::default()
        }
    }
}

/// Groq's OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    settings: LlmSettings,
}

impl GroqClient {
    pub fn new(api_key: String, client: Client, settings: LlmSettings) -> Self {
        Self {
            client,
            api_key,
            settings,
        }
    }

    fn payload(&self, prompt: &str) -> JsonValue {
        serde_json::json!({
            "model": self.settings.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": self.settings.temperature,
            "max_tokens": self.settings.max_tokens
        })
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(prompt))
            .timeout(self.settings.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Groq API Error {}: {}", status, text).into());
        }

        let body: JsonValue = res.json().await?;
        completion_text(&body)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid Groq response format").into())
    }
}

fn completion_text(body: &JsonValue) -> Option<&str> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completion_text_reads_first_choice() {
        let body = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "[{\"question\": \"Q\"}]"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        });
        assert_eq!(completion_text(&body), Some("[{\"question\": \"Q\"}]"));
        assert_eq!(completion_text(&json!({"choices": []})), None);
        assert_eq!(completion_text(&json!({"error": "quota"})), None);
    }

    #[test]
    fn payload_carries_model_and_sampling_settings() {
        let client = GroqClient::new("gsk-test".into(), Client::new(), LlmSettings::default());
        let payload = client.payload("hello");
        assert_eq!(payload["model"], DEFAULT_GROQ_MODEL);
        assert_eq!(payload["max_tokens"], 2000);
        assert_eq!(payload["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_error_not_a_panic() {
        let settings = LlmSettings {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(500),
            ..LlmSettings::default()
        };
        let client = GroqClient::new("gsk-test".into(), Client::new(), settings);
        assert!(client.complete("hello").await.is_err());
    }
}
