//! Agents: prompt rendering, model dispatch, and run observation.
//!
//! - [`base::Agent`]: binds a model, prompt data and a template. Start here.
//! - [`config::AgentConfig`]: name, role, streaming, and initial generation
//!   parameters.
//! - [`events`]: [`EventHandler`] trait and [`AgentEvent`] enum for observing
//!   runs. Includes [`LoggingHandler`], [`CompositeEventHandler`] and
//!   [`FnEventHandler`].
//! - [`prompt`]: prompt data, part combinators and JSON templates.

pub mod base;
pub mod config;
pub mod events;
pub mod prompt;

pub use base::{Agent, AgentState};
pub use config::{AgentConfig, DEFAULT_AGENT_NAME};
pub use events::{
    AgentEvent, CompositeEventHandler, EventHandler, FnEventHandler, LOG_DELIMITER,
    LoggingHandler, NoopHandler, run_log_lines,
};
