use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::capability::{CapabilitySlot, ChatBackend};

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn with_config(base_url: String, model: String) -> Self {
        OllamaClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn get_model(&self) -> &str {
        &self.model
    }

    fn chat_request(&self, prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        }
    }

    /// Health check. Returns the server version.
    pub async fn ping(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/api/version", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Ollama API error: {}", response.status()));
        }

        let version: VersionResponse = response.json().await?;
        Ok(version.version)
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    async fn chat(&self, prompt: &str) -> Result<Value> {
        let request = self.chat_request(prompt);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .context("could not reach Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama API error ({}): {}", status, body));
        }

        response
            .json::<Value>()
            .await
            .context("Ollama returned a malformed response")
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Keeps pinging the server until it answers, then makes the client
/// available to every tool through `slot`.
pub async fn connect(client: OllamaClient, slot: Arc<CapabilitySlot>, retry: Duration) {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match client.ping().await {
            Ok(version) => {
                tracing::info!(
                    url = %client.base_url,
                    model = client.get_model(),
                    version = %version,
                    attempt,
                    "connected to Ollama"
                );
                slot.install(Arc::new(client));
                return;
            }
            Err(e) => {
                if attempt == 1 {
                    tracing::warn!(url = %client.base_url, error = %e, "Ollama not reachable yet, retrying");
                } else {
                    tracing::debug!(url = %client.base_url, error = %e, attempt, "Ollama still not reachable");
                }
            }
        }
        tokio::time::sleep(retry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::normalize;

    #[test]
    fn client_creation_trims_trailing_slash() {
        let client = OllamaClient::with_config("http://localhost:11434/".into(), "llama3.2".into());
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.get_model(), "llama3.2");
    }

    #[test]
    fn request_builds_correctly() {
        let client = OllamaClient::with_config("http://localhost:11434".into(), "llama3.2".into());
        let json = serde_json::to_value(client.chat_request("Explain this")).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Explain this");
    }

    #[test]
    fn chat_response_normalizes_to_message_content() {
        let raw: Value = serde_json::from_str(
            r#"{"model":"llama3.2","created_at":"2024-01-01T00:00:00Z",
                "message":{"role":"assistant","content":"  O(n)\n"},"done":true}"#,
        )
        .unwrap();
        assert_eq!(normalize(raw).text, "O(n)");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        let client = OllamaClient::with_config("http://127.0.0.1:1".into(), "llama3.2".into());
        assert!(client.ping().await.is_err());
        assert!(client.chat("hi").await.is_err());
    }
}
