//! HTTP client for the OpenRouter chat completions API.

use super::streaming::sse_text_stream;
use crate::error::{Error, Result};
use crate::model::{LanguageModel, ModelFuture, ModelResponse, TextStream};
use crate::types::{GenerateConfig, Message};
use crate::{DEFAULT_MODEL, OPENROUTER_URL};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Unset generation parameters are omitted.
#[derive(Serialize, Debug)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ApiErrorResponse {
    pub(crate) message: String,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the OpenRouter chat completions API.
///
/// Implements [`LanguageModel`], so it can back any
/// [`Agent`](crate::agent::Agent).
///
/// ```ignore
/// let client = OpenRouterClient::new(api_key)?
///     .with_model("anthropic/claude-sonnet-4")
///     .with_max_tokens(1024);
/// let agent = Agent::new(Arc::new(client));
/// ```
pub struct OpenRouterClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) referer: String,
    pub(crate) title: String,
    pub(crate) endpoint: String,
    pub(crate) model: String,
    pub(crate) max_tokens: u32,
}

impl OpenRouterClient {
    /// Create a new client with the given API key and default headers.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_headers(api_key, "https://github.com/parley-rs", "parley")
    }

    /// Create a new client with custom Referer and X-Title headers.
    pub fn with_headers(
        api_key: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("parley/0.1")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Invocation(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            referer: referer.into(),
            title: title.into(),
            endpoint: OPENROUTER_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 0,
        })
    }

    /// Model identifier sent with every request. Default: [`DEFAULT_MODEL`].
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Response token limit. `0` leaves it to the provider.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Send requests somewhere other than [`OPENROUTER_URL`], e.g. a proxy
    /// or a compatible local server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Replace the underlying `reqwest` client, e.g. to change timeouts or
    /// proxy settings.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request body for `messages` under `config`.
    pub fn request<'a>(
        &'a self,
        messages: &'a [Message],
        config: &GenerateConfig,
        stream: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            presence_penalty: config.presence_penalty,
            stream,
        }
    }

    /// Send a chat completion request and return the reply text.
    pub async fn chat(&self, messages: &[Message], config: &GenerateConfig) -> Result<String> {
        let body = self.request(messages, config, false);
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temperature={:?}, top_p={:?}",
            body.model,
            body.messages.len(),
            body.max_tokens,
            body.temperature,
            body.top_p,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(&body).map_or(0, |s| s.len())
        );

        let start = Instant::now();
        let resp = self
            .post(&body)
            .send()
            .await
            .map_err(|e| Error::Invocation(format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Invocation(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(Error::Invocation(format!(
                "OpenRouter API HTTP {status}: {text}"
            )));
        }

        parse_chat_response(&text)
    }

    /// Send a chat completion request with SSE streaming and return the
    /// text deltas as they arrive.
    pub async fn chat_stream(
        &self,
        messages: &[Message],
        config: &GenerateConfig,
    ) -> Result<TextStream> {
        let body = self.request(messages, config, true);
        debug!(
            "Sending streaming chat request: model={}, messages={}",
            body.model,
            body.messages.len()
        );

        let resp = self
            .post(&body)
            .send()
            .await
            .map_err(|e| Error::Invocation(format!("streaming request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read error body: {e}>"));
            return Err(Error::Invocation(format!(
                "OpenRouter API HTTP {status}: {text}"
            )));
        }

        Ok(sse_text_stream(resp))
    }

    fn post(&self, body: &ChatRequest<'_>) -> reqwest::RequestBuilder {
        self.client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(body)
    }
}

impl LanguageModel for OpenRouterClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn invoke<'a>(
        &'a self,
        messages: &'a [Message],
        stream: bool,
        config: &'a GenerateConfig,
    ) -> ModelFuture<'a> {
        Box::pin(async move {
            if stream {
                Ok(ModelResponse::Stream(self.chat_stream(messages, config).await?))
            } else {
                Ok(ModelResponse::Text(self.chat(messages, config).await?))
            }
        })
    }
}

/// Extract the first choice's text from a non-streaming response body.
fn parse_chat_response(text: &str) -> Result<String> {
    let parsed: RawChatResponse = serde_json::from_str(text)
        .map_err(|e| Error::Invocation(format!("failed to parse response: {e}")))?;

    if let Some(err) = parsed.error {
        return Err(Error::Invocation(format!(
            "OpenRouter API error: {}",
            err.message
        )));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    let choice = parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| Error::Invocation("OpenRouter API returned no choices".into()))?;

    trace!("finish_reason: {:?}", choice.finish_reason);
    let content = choice.message.content.unwrap_or_default();
    debug!("LLM output: {} chars", content.len());
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> OpenRouterClient {
        OpenRouterClient::new("test-key").unwrap()
    }

    #[test]
    fn request_omits_unset_parameters() {
        let client = client();
        let messages = [Message::system("hi")];
        let body = serde_json::to_value(client.request(
            &messages,
            &GenerateConfig::default(),
            false,
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({
                "model": DEFAULT_MODEL,
                "messages": [{"role": "system", "content": "hi"}]
            })
        );
    }

    #[test]
    fn request_carries_config_and_stream_flag() {
        let client = client().with_model("m").with_max_tokens(64);
        let messages = [Message::user("q")];
        let config = GenerateConfig::default()
            .with_temperature(0.5)
            .with_presence_penalty(0.0);
        let body = serde_json::to_value(client.request(&messages, &config, true)).unwrap();
        assert_eq!(body["model"], "m");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["presence_penalty"], 0.0);
        assert_eq!(body["stream"], true);
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn parses_first_choice() {
        let text = json!({
            "choices": [{"message": {"content": "hello"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        })
        .to_string();
        assert_eq!(parse_chat_response(&text).unwrap(), "hello");
    }

    #[test]
    fn null_content_is_empty_text() {
        let text = json!({"choices": [{"message": {"content": null}}]}).to_string();
        assert_eq!(parse_chat_response(&text).unwrap(), "");
    }

    #[test]
    fn api_error_body_is_invocation_error() {
        let text = json!({"error": {"message": "invalid model"}}).to_string();
        assert_eq!(
            parse_chat_response(&text).unwrap_err(),
            Error::Invocation("OpenRouter API error: invalid model".into())
        );
    }

    #[test]
    fn missing_choices_is_invocation_error() {
        let err = parse_chat_response("{}").unwrap_err();
        assert!(matches!(err, Error::Invocation(_)));
        assert!(parse_chat_response("not json").is_err());
    }

    #[test]
    fn name_is_model_id() {
        let client = client().with_model("openai/gpt-4o");
        assert_eq!(LanguageModel::name(&client), "openai/gpt-4o");
        assert_eq!(client.model(), "openai/gpt-4o");
    }
}
