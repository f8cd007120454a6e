//! Configuration for an [`Agent`](super::Agent).
//!
//! ```ignore
//! let config = AgentConfig::new("Summarizer")
//!     .with_role(MessageRole::User)
//!     .with_streaming(true)
//!     .with_generate(GenerateConfig::default().with_temperature(0.2));
//!
//! let agent = Agent::from_config(model, config);
//! ```

use crate::error::Result;
use crate::types::{GenerateConfig, MessageRole};

/// Default agent name used in logs.
pub const DEFAULT_AGENT_NAME: &str = "Agent";

/// Settings an agent is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Name used in logs. Default: `"Agent"`.
    pub name: String,
    /// Role of the message carrying the rendered prompt. Default: `system`.
    pub role: MessageRole,
    /// Ask the model for a streaming response. Default: `false`.
    pub streaming: bool,
    /// Initial generation parameters. Default: none set.
    pub generate: GenerateConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_AGENT_NAME.to_string(),
            role: MessageRole::System,
            streaming: false,
            generate: GenerateConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<MessageRole>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_generate(mut self, generate: GenerateConfig) -> Self {
        self.generate = generate;
        self
    }

    /// Seed `generate` from [`GenerateConfig::from_env`].
    pub fn with_env_generate(mut self) -> Result<Self> {
        self.generate = GenerateConfig::from_env()?;
        Ok(self)
    }
}
