//! Deterministic models for tests and dry runs. No network access.

use super::{LanguageModel, ModelFuture, ModelResponse, TextStream};
use crate::error::{Error, Result};
use crate::types::{GenerateConfig, Message};
use futures::stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Echoes the last message back as `"ECHO: {content}"`.
///
/// In streaming mode the reply is split into whitespace-delimited chunks.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoModel;

impl LanguageModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    fn invoke<'a>(
        &'a self,
        messages: &'a [Message],
        stream: bool,
        _config: &'a GenerateConfig,
    ) -> ModelFuture<'a> {
        Box::pin(async move {
            let last = messages.last().map_or("[no input]", Message::content);
            let reply = format!("ECHO: {last}");
            Ok(respond(reply, stream))
        })
    }
}

/// One recorded call to a [`ScriptedModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCall {
    pub messages: Vec<Message>,
    pub stream: bool,
    pub config: GenerateConfig,
}

/// Replays a fixed queue of replies and records every call it receives.
///
/// Clones share the queue and the call log, so a test can keep one clone
/// for inspection while an agent owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<Result<String>>>>,
    calls: Arc<Mutex<Vec<ModelCall>>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(
                replies.into_iter().map(|r| Ok(r.into())).collect(),
            )),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(Ok(reply.into()));
    }

    /// Queue a failure for the next call.
    pub fn push_error(&self, message: impl Into<String>) {
        lock(&self.replies)
            .push_back(Err(Error::Invocation(message.into())));
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<ModelCall> {
        lock(&self.calls).clone()
    }

    pub fn last_call(&self) -> Option<ModelCall> {
        lock(&self.calls).last().cloned()
    }
}

impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn invoke<'a>(
        &'a self,
        messages: &'a [Message],
        stream: bool,
        config: &'a GenerateConfig,
    ) -> ModelFuture<'a> {
        Box::pin(async move {
            lock(&self.calls).push(ModelCall {
                messages: messages.to_vec(),
                stream,
                config: config.clone(),
            });
            let next = lock(&self.replies).pop_front();
            let reply = next.unwrap_or_else(|| {
                Err(Error::Invocation("scripted model has no replies left".into()))
            })?;
            Ok(respond(reply, stream))
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn respond(reply: String, stream: bool) -> ModelResponse {
    if stream {
        ModelResponse::Stream(chunked(reply))
    } else {
        ModelResponse::Text(reply)
    }
}

fn chunked(reply: String) -> TextStream {
    let chunks: Vec<Result<String>> = reply
        .split_inclusive(' ')
        .map(|chunk| Ok(chunk.to_string()))
        .collect();
    Box::pin(stream::iter(chunks))
}
