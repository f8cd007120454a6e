//! The [`Agent`]: a model, a prompt template, and the data it renders from.
//!
//! Each [`run`](Agent::run) renders the template against the bound data,
//! sends the result to the model as a single message, reports the exchange
//! to the event handler, and returns the model's response untouched.

use super::config::AgentConfig;
use super::events::{AgentEvent, EventHandler, LoggingHandler};
use super::prompt::{PromptData, PromptDataBinding, PromptPart, create_prompt};
use crate::error::{Error, Result};
use crate::model::{LanguageModel, ModelResponse};
use crate::types::{GenerateConfig, GenerateOverrides, Message, MessageRole};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Whether an agent has rendered a prompt yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// No prompt rendered.
    Idle,
    /// A prompt has been rendered and is available via [`Agent::prompt`].
    Rendered,
}

/// Binds a [`LanguageModel`], prompt data, and a template.
///
/// ```ignore
/// let shared = SharedPromptData::new(PromptData::new());
///
/// let mut summarizer = Agent::new(model.clone())
///     .with_name("Summarizer")
///     .with_data(shared.clone())
///     .with_template(vec![static_part("Summarize:\n"), field_part("document")]);
///
/// shared.update([("document", "...")]);
/// let summary = summarizer.run().await?.into_text().await?;
/// ```
///
/// # Generation config accumulates
///
/// Overrides passed to [`run_with`](Self::run_with) are merged into the
/// agent's stored config and stay there for later runs. Call
/// [`reset_generate_config`](Self::reset_generate_config) to drop them.
pub struct Agent {
    name: String,
    model: Arc<dyn LanguageModel>,
    data: Option<PromptDataBinding>,
    template: Vec<PromptPart>,
    role: MessageRole,
    streaming: bool,
    generate_config: GenerateConfig,
    prompt: Option<String>,
    event_handler: Arc<dyn EventHandler>,
}

impl Agent {
    /// Create an agent with default settings: role `system`, no streaming,
    /// no data, an empty template, and the [`LoggingHandler`].
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self::from_config(model, AgentConfig::default())
    }

    pub fn from_config(model: Arc<dyn LanguageModel>, config: AgentConfig) -> Self {
        Self {
            name: config.name,
            model,
            data: None,
            template: Vec::new(),
            role: config.role,
            streaming: config.streaming,
            generate_config: config.generate,
            prompt: None,
            event_handler: Arc::new(LoggingHandler),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bind owned [`PromptData`] or a
    /// [`SharedPromptData`](super::prompt::SharedPromptData) handle.
    pub fn with_data(mut self, data: impl Into<PromptDataBinding>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_template(mut self, template: Vec<PromptPart>) -> Self {
        self.template = template;
        self
    }

    pub fn with_role(mut self, role: impl Into<MessageRole>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_generate_config(mut self, config: GenerateConfig) -> Self {
        self.generate_config = config;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &MessageRole {
        &self.role
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// The stored config, including overrides accumulated by earlier runs.
    pub fn generate_config(&self) -> &GenerateConfig {
        &self.generate_config
    }

    /// Replace the stored config, discarding accumulated overrides.
    pub fn reset_generate_config(&mut self, config: GenerateConfig) {
        self.generate_config = config;
    }

    /// The most recently rendered prompt.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn state(&self) -> AgentState {
        if self.prompt.is_some() {
            AgentState::Rendered
        } else {
            AgentState::Idle
        }
    }

    pub fn template(&self) -> &[PromptPart] {
        &self.template
    }

    pub fn set_template(&mut self, template: Vec<PromptPart>) {
        self.template = template;
    }

    pub fn data(&self) -> Option<&PromptDataBinding> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: impl Into<PromptDataBinding>) {
        self.data = Some(data.into());
    }

    /// Update the bound data. Fails when no data is bound.
    pub fn update_data<K, V>(&mut self, new_fields: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.bound_data_mut()?.update(new_fields);
        Ok(())
    }

    /// Independent copy of the bound data, for forking a pipeline baseline.
    pub fn data_snapshot(&self) -> Result<PromptData> {
        Ok(self.bound_data()?.snapshot())
    }

    // ── Running ────────────────────────────────────────────────────

    /// Render the template against the bound data without storing it.
    pub fn render(&self) -> Result<String> {
        self.bound_data()?
            .with(|fields| create_prompt(fields, &self.template))
    }

    /// Run with no overrides. See [`run_with`](Self::run_with).
    pub async fn run(&mut self) -> Result<ModelResponse> {
        self.run_with(GenerateOverrides::new()).await
    }

    /// Render, merge `overrides` into the stored config, call the model, and
    /// return its response.
    ///
    /// Accepts a [`GenerateOverrides`] or a `&GenerateConfig` (whose set
    /// fields override). The merged config is validated before it replaces
    /// the stored one, so an invalid combination fails without reaching the
    /// model. Model errors are returned unchanged.
    pub async fn run_with(
        &mut self,
        overrides: impl Into<GenerateOverrides>,
    ) -> Result<ModelResponse> {
        let overrides = overrides.into();
        let result = self.run_once(&overrides).await;
        if let Err(error) = &result {
            self.event_handler.on_event(&AgentEvent::Failed {
                agent: &self.name,
                error,
            });
        }
        result
    }

    async fn run_once(&mut self, overrides: &GenerateOverrides) -> Result<ModelResponse> {
        let prompt = self.render()?;
        self.event_handler.on_event(&AgentEvent::PromptRendered {
            agent: &self.name,
            prompt: &prompt,
        });
        let messages = vec![Message::new(prompt.as_str(), self.role.clone())];
        self.prompt = Some(prompt);

        let mut merged = self.generate_config.clone();
        merged.apply(overrides);
        merged.validate()?;
        self.generate_config = merged;

        self.event_handler.on_event(&AgentEvent::Invoking {
            agent: &self.name,
            model: self.model.name(),
            stream: self.streaming,
        });
        let response = self
            .model
            .invoke(&messages, self.streaming, &self.generate_config)
            .await?;

        self.event_handler.on_event(&AgentEvent::Completed {
            agent: &self.name,
            role: &self.role,
            prompt: messages[0].content(),
            response: &response,
        });
        Ok(response)
    }

    fn bound_data(&self) -> Result<&PromptDataBinding> {
        self.data
            .as_ref()
            .ok_or_else(|| Error::MissingData(format!("agent '{}' has no prompt data", self.name)))
    }

    fn bound_data_mut(&mut self) -> Result<&mut PromptDataBinding> {
        let name = &self.name;
        self.data
            .as_mut()
            .ok_or_else(|| Error::MissingData(format!("agent '{name}' has no prompt data")))
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("role", &self.role)
            .field("streaming", &self.streaming)
            .field("generate_config", &self.generate_config)
            .field("template_parts", &self.template.len())
            .field("state", &self.state())
            .finish()
    }
}
