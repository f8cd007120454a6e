//! OpenRouter API interaction: the HTTP client and SSE streaming.
//!
//! - [`client`]: [`OpenRouterClient`], a [`LanguageModel`](crate::model::LanguageModel)
//!   backed by the chat completions endpoint.
//! - [`streaming`]: SSE decoding of incremental text deltas.

pub mod client;
pub mod streaming;

pub use client::{ChatRequest, OpenRouterClient, UsageInfo};
pub use streaming::{SseDecoder, sse_text_stream};
