//! The model-invocation seam.
//!
//! An [`Agent`](crate::agent::Agent) talks to a model only through the
//! [`LanguageModel`] trait. [`OpenRouterClient`](crate::api::OpenRouterClient)
//! is the HTTP implementation; [`mock`] holds deterministic ones for tests
//! and dry runs.

pub mod mock;

use crate::error::Result;
use crate::types::{GenerateConfig, Message};
use futures::{Stream, StreamExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub use mock::{EchoModel, ModelCall, ScriptedModel};

/// Incremental text fragments of a streaming response.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Boxed future returned by [`LanguageModel::invoke`].
pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<ModelResponse>> + Send + 'a>>;

/// What a model call produced.
pub enum ModelResponse {
    /// The complete response text.
    Text(String),
    /// Text fragments, yielded as the model generates them.
    Stream(TextStream),
}

impl ModelResponse {
    /// The text of a non-streaming response.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ModelResponse::Text(text) => Some(text),
            ModelResponse::Stream(_) => None,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, ModelResponse::Stream(_))
    }

    /// Full response text, draining the stream if there is one.
    pub async fn into_text(self) -> Result<String> {
        match self {
            ModelResponse::Text(text) => Ok(text),
            ModelResponse::Stream(mut stream) => {
                let mut text = String::new();
                while let Some(chunk) = stream.next().await {
                    text.push_str(&chunk?);
                }
                Ok(text)
            }
        }
    }
}

impl fmt::Debug for ModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelResponse::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ModelResponse::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl fmt::Display for ModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelResponse::Text(text) => f.write_str(text),
            ModelResponse::Stream(_) => f.write_str("<streaming response>"),
        }
    }
}

/// A chat model that turns messages into a response.
///
/// Implementations must not retry; errors are returned as
/// [`Error::Invocation`](crate::Error::Invocation) and reach the caller of
/// [`Agent::run`](crate::agent::Agent::run) unchanged.
///
/// ```ignore
/// impl LanguageModel for MyModel {
///     fn name(&self) -> &str { "my-model" }
///
///     fn invoke<'a>(
///         &'a self,
///         messages: &'a [Message],
///         stream: bool,
///         config: &'a GenerateConfig,
///     ) -> ModelFuture<'a> {
///         Box::pin(async move { Ok(ModelResponse::Text(self.complete(messages, config).await?)) })
///     }
/// }
/// ```
pub trait LanguageModel: Send + Sync {
    /// Model identifier used in logs.
    fn name(&self) -> &str;

    /// Send `messages` with the given sampling parameters. When `stream` is
    /// true the implementation should return [`ModelResponse::Stream`].
    fn invoke<'a>(
        &'a self,
        messages: &'a [Message],
        stream: bool,
        config: &'a GenerateConfig,
    ) -> ModelFuture<'a>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn into_text_collects_stream() {
        let chunks = vec![Ok("hel".to_string()), Ok("lo".to_string())];
        let response = ModelResponse::Stream(Box::pin(stream::iter(chunks)));
        assert!(response.is_stream());
        assert_eq!(response.into_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn into_text_propagates_stream_error() {
        let chunks = vec![
            Ok("partial".to_string()),
            Err(crate::Error::Invocation("connection reset".into())),
        ];
        let response = ModelResponse::Stream(Box::pin(stream::iter(chunks)));
        assert!(response.into_text().await.is_err());
    }

    #[test]
    fn display_hides_stream_contents() {
        let response = ModelResponse::Stream(Box::pin(stream::empty()));
        assert_eq!(response.to_string(), "<streaming response>");
        assert_eq!(ModelResponse::Text("hi".into()).to_string(), "hi");
    }
}
