//! Server-Sent Events (SSE) streaming for the OpenRouter chat completions API.
//!
//! [`OpenRouterClient::chat_stream`](super::OpenRouterClient::chat_stream)
//! hands the HTTP response to [`sse_text_stream`], which reads it
//! incrementally and yields text deltas until `data: [DONE]`.

use super::client::{ApiErrorResponse, UsageInfo};
use crate::error::{Error, Result};
use crate::model::TextStream;
use futures::stream;
use serde::Deserialize;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Raw SSE data chunk from the OpenRouter API.
#[derive(Deserialize, Debug)]
struct StreamChunk {
    choices: Option<Vec<StreamChoice>>,
    usage: Option<UsageInfo>,
    error: Option<ApiErrorResponse>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    delta: Option<StreamDelta>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamDelta {
    content: Option<String>,
}

/// Line decoder for an SSE body.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once `data: [DONE]` has been seen. Later input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed a network chunk, pushing any completed deltas onto `out`.
    pub fn feed(&mut self, chunk: &[u8], out: &mut VecDeque<Result<String>>) {
        if self.done {
            return;
        }
        self.buffer.extend_from_slice(chunk);
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            self.line(&String::from_utf8_lossy(&line), out);
            if self.done {
                self.buffer.clear();
                return;
            }
        }
    }

    /// Process whatever is left after the body ends without a newline.
    pub fn finish(&mut self, out: &mut VecDeque<Result<String>>) {
        if self.done {
            return;
        }
        let rest = std::mem::take(&mut self.buffer);
        self.line(&String::from_utf8_lossy(&rest), out);
        self.done = true;
    }

    fn line(&mut self, line: &str, out: &mut VecDeque<Result<String>>) {
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            return;
        }
        let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
            return;
        };
        if data == "[DONE]" {
            self.done = true;
            return;
        }
        parse_sse_data(data, out);
    }
}

/// Parse a single SSE `data:` payload into text deltas.
fn parse_sse_data(data: &str, out: &mut VecDeque<Result<String>>) {
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            if let Some(err) = chunk.error {
                out.push_back(Err(Error::Invocation(format!(
                    "OpenRouter API error: {}",
                    err.message
                ))));
                return;
            }
            if let Some(usage) = chunk.usage {
                debug!(
                    "Token usage: prompt={}, completion={}, total={}",
                    usage.prompt_tokens.unwrap_or(0),
                    usage.completion_tokens.unwrap_or(0),
                    usage.total_tokens.unwrap_or(0),
                );
            }
            for choice in chunk.choices.unwrap_or_default() {
                if let Some(content) = choice.delta.and_then(|d| d.content)
                    && !content.is_empty()
                {
                    out.push_back(Ok(content));
                }
                if choice.finish_reason.is_some() {
                    trace!("Stream finish_reason: {:?}", choice.finish_reason);
                }
            }
        }
        Err(e) => {
            warn!("Failed to parse SSE chunk: {e}: data: {data}");
        }
    }
}

struct StreamState {
    resp: Option<reqwest::Response>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String>>,
}

/// Turn a streaming response into a [`TextStream`] of content deltas.
///
/// The body is read via `chunk()` so long responses don't hit a single-body
/// timeout. A read error ends the stream after it is yielded.
pub fn sse_text_stream(resp: reqwest::Response) -> TextStream {
    let state = StreamState {
        resp: Some(resp),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
    };
    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            let resp = state.resp.as_mut()?;
            match resp.chunk().await {
                Ok(Some(chunk)) => {
                    state.decoder.feed(&chunk, &mut state.pending);
                    if state.decoder.is_done() {
                        debug!("Stream completed");
                        state.resp = None;
                    }
                }
                Ok(None) => {
                    state.decoder.finish(&mut state.pending);
                    debug!("Stream body ended");
                    state.resp = None;
                }
                Err(e) => {
                    state.resp = None;
                    return Some((
                        Err(Error::Invocation(format!(
                            "failed to read streaming chunk: {e}"
                        ))),
                        state,
                    ));
                }
            }
        }
    }))
}
