//! Prompt-assembly agents on top of the [OpenRouter](https://openrouter.ai/)
//! chat completions API.
//!
//! An [`Agent`] renders a template of [`PromptPart`]s against named
//! [`PromptData`], sends the result to a [`LanguageModel`] as a single
//! message, logs the exchange, and hands back the response.
//!
//! # Getting started
//!
//! ```ignore
//! use parley::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> parley::Result<()> {
//!     let api_key = std::env::var("OPENROUTER_KEY").unwrap_or_default();
//!     let client = OpenRouterClient::new(api_key)?;
//!
//!     let data = PromptData::from_value(serde_json::json!({
//!         "topic": "borrow checking",
//!         "audience": "",
//!     }))?;
//!
//!     let mut agent = Agent::new(Arc::new(client))
//!         .with_name("Explainer")
//!         .with_data(data)
//!         .with_template(vec![
//!             static_part("Explain "),
//!             field_part("topic"),
//!             when(|d| Ok(!d.str("audience")?.is_empty()), " for beginners"),
//!             static_part("."),
//!         ]);
//!
//!     let response = agent
//!         .run_with(&GenerateConfig::default().with_temperature(0.2))
//!         .await?;
//!     println!("{}", response.into_text().await?);
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! - **Build prompts:** [`agent::prompt`] has the part combinators
//!   ([`static_part`](agent::prompt::static_part),
//!   [`conditional_part`](agent::prompt::conditional_part),
//!   [`field_part`](agent::prompt::field_part),
//!   [`history_part`](agent::prompt::history_part)) and
//!   [`TemplateFile`](agent::prompt::TemplateFile) for JSON templates.
//!
//! - **Share data across agents:** bind the same
//!   [`SharedPromptData`](agent::prompt::SharedPromptData) to several agents;
//!   an update through one handle is visible to all of them.
//!
//! - **Observe runs:** implement [`EventHandler`](agent::events::EventHandler),
//!   or use [`LoggingHandler`](agent::events::LoggingHandler) (the default).
//!
//! - **Plug in another backend:** implement [`LanguageModel`]. The
//!   [`model::mock`] models are handy in tests.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | [`Agent`], config, events, prompt assembly |
//! | [`api`] | [`OpenRouterClient`](api::OpenRouterClient) and SSE streaming |
//! | [`model`] | [`LanguageModel`] trait, [`ModelResponse`], mock models |
//! | [`types`] | [`Message`], [`MessageRole`], [`ChatHistory`], [`GenerateConfig`] |
//! | [`error`] | [`Error`] and [`Result`] |

pub mod agent;
pub mod api;
pub mod error;
pub mod model;
pub mod prelude;
pub mod types;

pub use agent::prompt::{PromptData, PromptPart};
pub use agent::{Agent, AgentConfig};
pub use error::{Error, Result};
pub use model::{LanguageModel, ModelResponse};
pub use types::{ChatHistory, GenerateConfig, GenerateOverrides, Message, MessageRole};

// ── Constants ──────────────────────────────────────────────────────

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for all LLM calls.
pub const DEFAULT_MODEL: &str = "z-ai/glm-5";
