//! Convenience re-exports for common `parley` types.
//!
//! ```ignore
//! use parley::prelude::*;
//! ```
//!
//! Pulls in the [`Agent`] and its config, the prompt combinators, prompt
//! data, the value types, and the model seam. SSE decoding and the wire
//! request types are left out; import those from [`crate::api`].

// ── Core types ──────────────────────────────────────────────────────
pub use crate::error::{Error, Result};
pub use crate::types::{ChatHistory, GenerateConfig, GenerateOverrides, Message, MessageRole};

// ── Agent runtime ───────────────────────────────────────────────────
pub use crate::agent::{
    Agent, AgentConfig, AgentEvent, AgentState, CompositeEventHandler, EventHandler,
    FnEventHandler, LoggingHandler, NoopHandler,
};

// ── Prompt assembly ─────────────────────────────────────────────────
pub use crate::agent::prompt::{
    Content, PromptData, PromptDataBinding, PromptPart, SharedPromptData, TemplateFile,
    conditional_part, create_prompt, field_part, generated, history_part, history_to_text,
    static_part, when,
};

// ── Models ──────────────────────────────────────────────────────────
pub use crate::api::OpenRouterClient;
pub use crate::model::{EchoModel, LanguageModel, ModelFuture, ModelResponse, TextStream};
