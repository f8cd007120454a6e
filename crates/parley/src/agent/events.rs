//! Event system for observing agent runs.
//!
//! Every [`Agent::run`](super::Agent::run) emits [`AgentEvent`]s to the
//! agent's [`EventHandler`]. Handlers are purely observational: nothing they
//! do changes the prompt, the config, or the returned response.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`LoggingHandler`] | Delimited input/output blocks via `tracing` (default) |
//! | [`NoopHandler`] | Silence |
//! | [`FnEventHandler`] | Quick closures for simple callbacks |
//! | [`CompositeEventHandler`] | Compose multiple handlers in order |

use crate::error::Error;
use crate::model::ModelResponse;
use crate::types::MessageRole;
use tracing::{debug, info, warn};

/// Separator line written around each logged run.
pub const LOG_DELIMITER: &str = "____________________";

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted by an agent during a run.
#[derive(Debug)]
pub enum AgentEvent<'a> {
    /// The template rendered successfully.
    PromptRendered { agent: &'a str, prompt: &'a str },
    /// The model is about to be called.
    Invoking {
        agent: &'a str,
        model: &'a str,
        stream: bool,
    },
    /// The model returned a response.
    Completed {
        agent: &'a str,
        role: &'a MessageRole,
        prompt: &'a str,
        response: &'a ModelResponse,
    },
    /// The run failed. The error is returned to the caller unchanged.
    Failed { agent: &'a str, error: &'a Error },
}

// ── Handler trait ──────────────────────────────────────────────────

/// Trait for observing agent events.
///
/// # Example
///
/// ```ignore
/// struct PromptDump;
///
/// impl EventHandler for PromptDump {
///     fn on_event(&self, event: &AgentEvent<'_>) {
///         if let AgentEvent::PromptRendered { prompt, .. } = event {
///             println!("{prompt}");
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &AgentEvent<'_>) {
        let _ = event;
    }
}

/// A handler that ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
pub struct FnEventHandler<F>(F)
where
    F: Fn(&AgentEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&AgentEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&AgentEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &AgentEvent<'_>) {
        (self.0)(event)
    }
}

/// An event handler that delegates to multiple inner handlers in
/// registration order.
///
/// ```ignore
/// let handler = CompositeEventHandler::new()
///     .with(LoggingHandler)
///     .with(my_metrics_handler);
/// ```
#[derive(Default)]
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Conditionally add a handler to the chain.
    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &AgentEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

// ── Logging handler ────────────────────────────────────────────────

/// Logs each completed run as a delimited block:
///
/// ```text
/// ____________________
/// AGENT: Summarizer
/// ROLE: system
/// INPUT:
/// <rendered prompt>
/// OUTPUT:
/// <response>
/// ____________________
/// ```
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &AgentEvent<'_>) {
        match event {
            AgentEvent::PromptRendered { agent, prompt } => {
                debug!("{agent}: rendered prompt ({} chars)", prompt.len());
            }
            AgentEvent::Invoking {
                agent,
                model,
                stream,
            } => {
                debug!("{agent}: invoking {model} (stream={stream})");
            }
            AgentEvent::Completed {
                agent,
                role,
                prompt,
                response,
            } => {
                for line in run_log_lines(agent, role, prompt, response) {
                    info!("{line}");
                }
            }
            AgentEvent::Failed { agent, error } => {
                warn!("{agent}: run failed: {error}");
            }
        }
    }
}

/// The three records [`LoggingHandler`] writes for a completed run.
///
/// A streaming response is not drained and appears as `<streaming response>`.
pub fn run_log_lines(
    agent: &str,
    role: &MessageRole,
    prompt: &str,
    response: &ModelResponse,
) -> [String; 3] {
    [
        format!("\n{LOG_DELIMITER}\nAGENT: {agent}"),
        format!("ROLE: {role}\nINPUT:\n{prompt}"),
        format!("OUTPUT:\n{response}\n{LOG_DELIMITER}\n"),
    ]
}
