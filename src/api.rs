//! LLM API interaction over an OpenAI-compatible chat completions endpoint.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`ChatClient`]: HTTP implementation (Groq by default, any OpenAI-compatible base works)
//! - [`ResponseFormat`]: Optional JSON-schema constraint for structured replies
//!
//! Calls are made once. There is no retry layer; callers turn failures into
//! fallback values.

use crate::config::Settings;
use crate::error::{ConfigError, ModelError};
use crate::schema::strict_schema;
use crate::utils::truncate_for_log;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// `response_format` payload constraining the reply to a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
    pub json_schema: JsonSchemaFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

impl ResponseFormat {
    /// Strict JSON-schema format for the Rust type `T`.
    pub fn json_schema<T: JsonSchema>(name: &str) -> Self {
        Self {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: name.to_string(),
                strict: true,
                schema: strict_schema::<T>(),
            },
        }
    }
}

/// Trait for async LLM interaction.
///
/// Implementors send a conversation to a model and return the text of its
/// reply. The trait is the seam that lets the summarization engine run
/// against a scripted model in tests.
pub trait AskAsync {
    /// Send `messages` and return the reply content.
    ///
    /// When `format` is given the model is asked to answer with JSON matching
    /// the schema; the reply is still returned as raw text for the caller to
    /// decode.
    async fn ask(
        &self,
        messages: &[ChatMessage],
        format: Option<&ResponseFormat>,
    ) -> Result<String, ModelError>;
}

impl<T: AskAsync> AskAsync for &T {
    async fn ask(
        &self,
        messages: &[ChatMessage],
        format: Option<&ResponseFormat>,
    ) -> Result<String, ModelError> {
        (**self).ask(messages, format).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Chat completions client for an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: Option<f32>,
}

impl ChatClient {
    /// Build a client. An empty API key is a configuration error.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("GROQ_API_KEY"));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: None,
        })
    }

    pub fn from_settings(api_key: impl Into<String>, settings: &Settings) -> Result<Self, ConfigError> {
        let client = Self::new(
            api_key,
            settings.llm_api_base.clone(),
            settings.model.clone(),
            settings.model_timeout(),
        )?;
        Ok(match settings.temperature {
            Some(t) => client.with_temperature(t),
            None => client,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl AskAsync for ChatClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model, structured = format.is_some()))]
    async fn ask(
        &self,
        messages: &[ChatMessage],
        format: Option<&ResponseFormat>,
    ) -> Result<String, ModelError> {
        let t0 = Instant::now();
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            response_format: format,
        };

        debug!(messages = messages.len(), "Sending chat completion request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Model API returned an error status"
            );
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 500),
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ModelError::EmptyReply)?;

        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = content.len(),
            "Model replied"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StockAnalysis;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn client(server: &MockServer) -> ChatClient {
        ChatClient::new("test-key", server.url("/openai/v1"), "test-model", Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = ChatClient::new(" ", "http://localhost", "m", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("GROQ_API_KEY")));
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, json!({"role": "assistant", "content": "hi"}));
    }

    #[tokio::test]
    async fn test_free_text_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/openai/v1/chat/completions")
                    .header("authorization", "Bearer test-key")
                    .json_body(json!({
                        "model": "test-model",
                        "messages": [{"role": "user", "content": "Summarize"}]
                    }));
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "  A summary.  "}}]
                }));
            })
            .await;

        let reply = client(&server)
            .ask(&[ChatMessage::user("Summarize")], None)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "  A summary.  ");
    }

    #[test]
    fn test_structured_request_carries_schema() {
        let format = ResponseFormat::json_schema::<StockAnalysis>("stock_analysis");
        let messages = [ChatMessage::user("Analyze")];
        let request = ChatRequest {
            model: "test-model",
            messages: &messages,
            temperature: Some(0.0),
            response_format: Some(&format),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_schema");
        assert_eq!(json["response_format"]["json_schema"]["name"], "stock_analysis");
        assert_eq!(json["response_format"]["json_schema"]["strict"], true);
        assert!(json["response_format"]["json_schema"]["schema"]["properties"]["key_events"].is_object());
        assert_eq!(json["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_reply_without_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/openai/v1/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": null}}]
                }));
            })
            .await;

        let err = client(&server).ask(&[ChatMessage::user("x")], None).await.unwrap_err();
        assert!(matches!(err, ModelError::EmptyReply));
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/openai/v1/chat/completions");
                then.status(429).body("rate limited");
            })
            .await;

        let err = client(&server).ask(&[ChatMessage::user("x")], None).await.unwrap_err();
        match err {
            ModelError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/openai/v1/chat/completions");
                then.status(200).json_body(json!({"choices": []}));
            })
            .await;

        let err = client(&server).ask(&[ChatMessage::user("x")], None).await.unwrap_err();
        assert!(matches!(err, ModelError::EmptyReply));
    }
}
