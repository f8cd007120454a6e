//! Value objects exchanged with the model: messages, chat history and
//! generation parameters.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable that seeds [`GenerateConfig::from_env`].
pub const PRESENCE_PENALTY_ENV: &str = "PRESENCE_PENALTY";

// ── Roles ──────────────────────────────────────────────────────────

/// Role of a message sender.
///
/// Roles outside the three known ones are kept verbatim in
/// [`MessageRole::Other`] and treated as passthrough text downstream.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "String")]
pub enum MessageRole {
    System,
    #[default]
    User,
    Assistant,
    Other(String),
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Other(role) => role,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MessageRole {
    fn from(role: &str) -> Self {
        match role {
            "system" => MessageRole::System,
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => MessageRole::Other(other.to_string()),
        }
    }
}

impl From<String> for MessageRole {
    fn from(role: String) -> Self {
        match role.as_str() {
            "system" | "user" | "assistant" => MessageRole::from(role.as_str()),
            _ => MessageRole::Other(role),
        }
    }
}

impl From<MessageRole> for String {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

// ── Messages ───────────────────────────────────────────────────────

/// A single message in a conversation. Immutable once constructed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    #[serde(default)]
    role: MessageRole,
    content: String,
}

impl Message {
    pub fn new(content: impl Into<String>, role: impl Into<MessageRole>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(content, MessageRole::System)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, MessageRole::User)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, MessageRole::Assistant)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn role(&self) -> &MessageRole {
        &self.role
    }
}

/// A conversation transcript.
///
/// `truncated` is an annotation set by whoever built the history; nothing in
/// this crate enforces it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatHistory {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub truncated: bool,
}

impl ChatHistory {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            truncated: false,
        }
    }
}

// ── Generation parameters ──────────────────────────────────────────

/// Sampling parameters sent with every model call.
///
/// `temperature` and `top_p` are mutually exclusive. [`GenerateConfig::new`]
/// and deserialization validate eagerly; the `with_*` builders do not, so
/// [`validate`](Self::validate) runs again before each model call.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(try_from = "RawGenerateConfig")]
pub struct GenerateConfig {
    /// Randomness of the output, 0.0–1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold, 0.0–1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Penalty for repeating tokens already present, -2.0–2.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGenerateConfig {
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    top_p: Option<f32>,
    #[serde(default)]
    presence_penalty: Option<f32>,
}

impl TryFrom<RawGenerateConfig> for GenerateConfig {
    type Error = Error;

    fn try_from(raw: RawGenerateConfig) -> Result<Self> {
        Self::new(raw.temperature, raw.top_p, raw.presence_penalty)
    }
}

impl GenerateConfig {
    /// Build a validated config.
    pub fn new(
        temperature: Option<f32>,
        top_p: Option<f32>,
        presence_penalty: Option<f32>,
    ) -> Result<Self> {
        let config = Self {
            temperature,
            top_p,
            presence_penalty,
        };
        config.validate()?;
        Ok(config)
    }

    /// Config with `presence_penalty` read from `PRESENCE_PENALTY`
    /// (`0.0` when unset).
    pub fn from_env() -> Result<Self> {
        let presence_penalty = match std::env::var(PRESENCE_PENALTY_ENV) {
            Ok(raw) => raw.trim().parse::<f32>().map_err(|e| {
                Error::Validation(format!("{PRESENCE_PENALTY_ENV}={raw:?} is not a number: {e}"))
            })?,
            Err(_) => 0.0,
        };
        Self::new(None, None, Some(presence_penalty))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_presence_penalty(mut self, presence_penalty: f32) -> Self {
        self.presence_penalty = Some(presence_penalty);
        self
    }

    /// Check ranges and the temperature/top_p exclusion.
    pub fn validate(&self) -> Result<()> {
        if self.temperature.is_some() && self.top_p.is_some() {
            return Err(Error::Validation(
                "only one of 'temperature' or 'top_p' can be set, not both".into(),
            ));
        }
        check_range("temperature", self.temperature, 0.0, 1.0)?;
        check_range("top_p", self.top_p, 0.0, 1.0)?;
        check_range("presence_penalty", self.presence_penalty, -2.0, 2.0)?;
        Ok(())
    }

    /// Copy every field set in `overrides` over `self`.
    pub fn merge(&mut self, overrides: &GenerateConfig) {
        if let Some(t) = overrides.temperature {
            self.temperature = Some(t);
        }
        if let Some(p) = overrides.top_p {
            self.top_p = Some(p);
        }
        if let Some(pp) = overrides.presence_penalty {
            self.presence_penalty = Some(pp);
        }
    }

    /// Apply per-run overrides: every touched field wins, including an
    /// explicit unset.
    pub fn apply(&mut self, overrides: &GenerateOverrides) {
        if let Some(t) = overrides.temperature {
            self.temperature = t;
        }
        if let Some(p) = overrides.top_p {
            self.top_p = p;
        }
        if let Some(pp) = overrides.presence_penalty {
            self.presence_penalty = pp;
        }
    }

    /// True when no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.presence_penalty.is_none()
    }
}

/// Per-run changes to a [`GenerateConfig`].
///
/// Each field is `None` when left alone, `Some(None)` to clear the stored
/// value, and `Some(Some(v))` to set it.
///
/// ```ignore
/// // Switch a stored temperature over to nucleus sampling.
/// agent
///     .run_with(GenerateOverrides::new().unset_temperature().with_top_p(0.9))
///     .await?;
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GenerateOverrides {
    pub temperature: Option<Option<f32>>,
    pub top_p: Option<Option<f32>>,
    pub presence_penalty: Option<Option<f32>>,
}

impl GenerateOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(Some(temperature));
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(Some(top_p));
        self
    }

    pub fn with_presence_penalty(mut self, presence_penalty: f32) -> Self {
        self.presence_penalty = Some(Some(presence_penalty));
        self
    }

    pub fn unset_temperature(mut self) -> Self {
        self.temperature = Some(None);
        self
    }

    pub fn unset_top_p(mut self) -> Self {
        self.top_p = Some(None);
        self
    }

    pub fn unset_presence_penalty(mut self) -> Self {
        self.presence_penalty = Some(None);
        self
    }

    /// True when no field is touched.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.presence_penalty.is_none()
    }
}

/// Fields set in the config override; unset fields are left alone.
impl From<&GenerateConfig> for GenerateOverrides {
    fn from(config: &GenerateConfig) -> Self {
        Self {
            temperature: config.temperature.map(Some),
            top_p: config.top_p.map(Some),
            presence_penalty: config.presence_penalty.map(Some),
        }
    }
}

impl From<GenerateConfig> for GenerateOverrides {
    fn from(config: GenerateConfig) -> Self {
        Self::from(&config)
    }
}

fn check_range(name: &str, value: Option<f32>, min: f32, max: f32) -> Result<()> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(Error::Validation(format!(
            "'{name}' must be between {min} and {max}, got {v}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_preserves_fields() {
        for role in ["system", "user", "assistant"] {
            let msg = Message::new("hello there", role);
            assert_eq!(msg.content(), "hello there");
            assert_eq!(msg.role().as_str(), role);
        }
    }

    #[test]
    fn message_role_defaults_to_user() {
        let msg: Message = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert_eq!(msg.role(), &MessageRole::User);
    }

    #[test]
    fn unknown_role_is_passthrough() {
        let msg = Message::new("result", "tool");
        assert_eq!(msg.role(), &MessageRole::Other("tool".into()));
        assert_eq!(msg.role().to_string(), "tool");

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
    }

    #[test]
    fn known_role_round_trips_as_lowercase() {
        let json = serde_json::to_value(Message::assistant("ok")).unwrap();
        assert_eq!(json["role"], "assistant");
        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back.role(), &MessageRole::Assistant);
    }

    #[test]
    fn chat_history_truncated_defaults_false() {
        let history: ChatHistory =
            serde_json::from_str(r#"{"messages": [{"role": "user", "content": "hi"}]}"#).unwrap();
        assert_eq!(history.messages.len(), 1);
        assert!(!history.truncated);
    }

    #[test]
    fn temperature_and_top_p_are_exclusive() {
        assert!(matches!(
            GenerateConfig::new(Some(0.5), Some(0.9), None),
            Err(Error::Validation(_))
        ));
        assert!(GenerateConfig::new(Some(0.5), None, None).is_ok());
        assert!(GenerateConfig::new(None, Some(0.9), None).is_ok());
        assert!(GenerateConfig::new(None, None, None).is_ok());
    }

    #[test]
    fn out_of_range_values_rejected() {
        assert!(GenerateConfig::new(Some(1.5), None, None).is_err());
        assert!(GenerateConfig::new(None, Some(-0.1), None).is_err());
        assert!(GenerateConfig::new(None, None, Some(2.5)).is_err());
        assert!(GenerateConfig::new(None, None, Some(-2.0)).is_ok());
        assert!(GenerateConfig::new(Some(f32::NAN), None, None).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let err = serde_json::from_str::<GenerateConfig>(r#"{"temperature": 0.2, "top_p": 0.3}"#);
        assert!(err.is_err());

        let ok: GenerateConfig = serde_json::from_str(r#"{"top_p": 0.3}"#).unwrap();
        assert_eq!(ok.top_p, Some(0.3));
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let err = serde_json::from_str::<GenerateConfig>(r#"{"max_tokens": 10}"#);
        assert!(err.is_err());
    }

    #[test]
    fn builders_do_not_validate_until_asked() {
        let config = GenerateConfig::default()
            .with_temperature(0.4)
            .with_top_p(0.8);
        assert!(config.validate().is_err());
    }

    #[test]
    fn merge_overrides_win() {
        let mut base = GenerateConfig::default()
            .with_temperature(0.1)
            .with_presence_penalty(0.0);
        base.merge(&GenerateConfig::default().with_temperature(0.7));
        assert_eq!(base.temperature, Some(0.7));
        assert_eq!(base.presence_penalty, Some(0.0));
        assert_eq!(base.top_p, None);
    }

    #[test]
    fn overrides_can_clear_fields() {
        let mut base = GenerateConfig::default()
            .with_temperature(0.5)
            .with_presence_penalty(1.0);
        base.apply(&GenerateOverrides::new().unset_temperature().with_top_p(0.9));
        assert_eq!(base.temperature, None);
        assert_eq!(base.top_p, Some(0.9));
        assert_eq!(base.presence_penalty, Some(1.0));
        assert!(base.validate().is_ok());
    }

    #[test]
    fn config_converts_to_set_only_overrides() {
        let overrides = GenerateOverrides::from(&GenerateConfig::default().with_top_p(0.3));
        assert_eq!(overrides.top_p, Some(Some(0.3)));
        assert_eq!(overrides.temperature, None);
        assert!(GenerateOverrides::from(GenerateConfig::default()).is_empty());
    }

    #[test]
    fn serialization_skips_unset_fields() {
        let json = serde_json::to_value(GenerateConfig::default().with_top_p(0.5)).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["top_p"], 0.5);
    }
}
