//! Completion client for an OpenAI-compatible chat completions endpoint.
//!
//! One request, one response. Failures are typed and returned to the
//! routing engine, which logs them and treats the tick as "no reply";
//! nothing here is ever fatal to the daemon.

use crate::session::Turn;
use desk_common::config::CompletionConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Completion call failure.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Network or connection error
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-200 response from the endpoint
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// 200 response that does not match the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Client for a single configured chat completions endpoint.
pub struct CompletionClient {
    config: CompletionConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    stop: &'a [String],
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl CompletionClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            config,
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Endpoint URL this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Request a completion for the full ordered turn sequence.
    ///
    /// Success is HTTP 200 with `choices[0].message.content`; the text is
    /// returned trimmed. Everything else is a `CompletionError`.
    pub async fn complete(&self, turns: &[Turn], max_tokens: u32) -> Result<String, CompletionError> {
        let request = ChatCompletionRequest {
            model: self.config.model.as_deref(),
            messages: turns
                .iter()
                .map(|t| WireMessage {
                    role: t.role.as_str(),
                    content: &t.content,
                })
                .collect(),
            max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            stop: &self.config.stop,
        };

        let mut req = self.client.post(&self.config.endpoint).json(&request);
        if let Some(ref key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Malformed("empty choices array".into()))?;

        Ok(choice.message.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, Turn};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(url: String) -> CompletionClient {
        CompletionClient::new(CompletionConfig {
            endpoint: url,
            ..CompletionConfig::default()
        })
    }

    #[test]
    fn request_serializes_five_field_payload() {
        let req = ChatCompletionRequest {
            model: None,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: "Be direct",
                },
                WireMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            max_tokens: 500,
            temperature: 0.8,
            top_p: 1.0,
            stop: &["\n".to_string()],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["stop"][0], "\n");
        // model is omitted entirely when unset
        assert!(json.get("model").is_none());
    }

    #[test]
    fn response_deserializes() {
        let json = r#"{"choices": [{"message": {"content": "Hello!"}}]}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices[0].message.content, "Hello!");
    }

    #[tokio::test]
    async fn success_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "  hello there \n"}}]
            })))
            .mount(&server)
            .await;

        let client = client_for(format!("{}/v1/chat/completions", server.uri()));
        let turns = vec![Turn::new(Role::User, "hi")];
        let text = client.complete(&turns, 500).await.unwrap();
        assert_eq!(text, "hello there");
    }

    #[tokio::test]
    async fn non_200_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(format!("{}/v1/chat/completions", server.uri()));
        let turns = vec![Turn::new(Role::User, "hi")];
        let err = client.complete(&turns, 500).await.unwrap_err();
        match err {
            CompletionError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = client_for(format!("{}/v1/chat/completions", server.uri()));
        let turns = vec![Turn::new(Role::User, "hi")];
        assert!(matches!(
            client.complete(&turns, 500).await,
            Err(CompletionError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Port 1 is never listening
        let client = client_for("http://127.0.0.1:1/v1/chat/completions".into());
        let turns = vec![Turn::new(Role::User, "hi")];
        assert!(matches!(
            client.complete(&turns, 500).await,
            Err(CompletionError::Transport(_))
        ));
    }
}
