//! Prompt-part combinators.
//!
//! A [`PromptPart`] is a pure function from [`PromptData`] to text. Parts are
//! built from [`Content`] values (a literal string or a generator function),
//! optionally guarded by a condition, and concatenated by [`create_prompt`].
//!
//! A part that needs a field which is not there returns
//! [`Error::MissingData`]; it never renders as empty text.
//!
//! # Example
//!
//! ```
//! use parley::agent::prompt::{PromptData, conditional_part, create_prompt, generated, static_part};
//! use serde_json::json;
//!
//! let template = vec![
//!     static_part("You answer questions.\n"),
//!     static_part(generated(|d| Ok(format!("Question: {}\n", d.str("question")?)))),
//!     conditional_part(
//!         |d| Ok(!d.list("docs")?.is_empty()),
//!         "Use the documents below.",
//!         "Answer from memory.",
//!     ),
//! ];
//!
//! let data = [("question", json!("Why?")), ("docs", json!([]))].into_iter().collect::<PromptData>();
//! let prompt = create_prompt(&data, &template).unwrap();
//! assert_eq!(prompt, "You answer questions.\nQuestion: Why?\nAnswer from memory.");
//! ```

use super::data::PromptData;
use crate::error::{Error, Result};
use crate::types::{ChatHistory, Message};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Default number of trailing messages rendered by [`history_part`].
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Text generator over prompt data.
pub type Generator = Arc<dyn Fn(&PromptData) -> Result<String> + Send + Sync>;

/// Predicate over prompt data.
pub type Condition = Arc<dyn Fn(&PromptData) -> Result<bool> + Send + Sync>;

// ── Content ────────────────────────────────────────────────────────

/// Literal text or a function producing text from the data.
#[derive(Clone)]
pub enum Content {
    Literal(String),
    Generator(Generator),
}

impl Content {
    /// The empty literal. Default false branch of [`when`].
    pub fn empty() -> Self {
        Content::Literal(String::new())
    }

    /// Resolve against the data: literals return themselves, generators are
    /// called.
    pub fn render(&self, data: &PromptData) -> Result<String> {
        match self {
            Content::Literal(text) => Ok(text.clone()),
            Content::Generator(generate) => generate(data),
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Content::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Literal(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Literal(text)
    }
}

/// Wrap a function as [`Content::Generator`].
pub fn generated(
    f: impl Fn(&PromptData) -> Result<String> + Send + Sync + 'static,
) -> Content {
    Content::Generator(Arc::new(f))
}

// ── Parts ──────────────────────────────────────────────────────────

/// A composable, stateless prompt fragment.
#[derive(Clone)]
pub struct PromptPart {
    kind: &'static str,
    render: Generator,
}

impl PromptPart {
    /// Wrap an arbitrary rendering function.
    pub fn new(render: impl Fn(&PromptData) -> Result<String> + Send + Sync + 'static) -> Self {
        Self::with_kind("custom", render)
    }

    fn with_kind(
        kind: &'static str,
        render: impl Fn(&PromptData) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            render: Arc::new(render),
        }
    }

    pub fn render(&self, data: &PromptData) -> Result<String> {
        (self.render)(data)
    }

    /// Which combinator built this part (`"static"`, `"conditional"`, ...).
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl fmt::Debug for PromptPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptPart").field("kind", &self.kind).finish()
    }
}

/// A part that always renders `content`.
pub fn static_part(content: impl Into<Content>) -> PromptPart {
    let content = content.into();
    PromptPart::with_kind("static", move |data| content.render(data))
}

/// A part that renders `true_part` when `condition` holds, else `false_part`.
pub fn conditional_part(
    condition: impl Fn(&PromptData) -> Result<bool> + Send + Sync + 'static,
    true_part: impl Into<Content>,
    false_part: impl Into<Content>,
) -> PromptPart {
    let condition: Condition = Arc::new(condition);
    let true_part = true_part.into();
    let false_part = false_part.into();
    PromptPart::with_kind("conditional", move |data| {
        if condition(data)? {
            true_part.render(data)
        } else {
            false_part.render(data)
        }
    })
}

/// [`conditional_part`] with an empty false branch.
pub fn when(
    condition: impl Fn(&PromptData) -> Result<bool> + Send + Sync + 'static,
    true_part: impl Into<Content>,
) -> PromptPart {
    conditional_part(condition, true_part, Content::empty())
}

/// A part that renders a scalar field verbatim.
///
/// Strings render as-is; numbers and booleans render as their JSON text.
pub fn field_part(key: impl Into<String>) -> PromptPart {
    let key = key.into();
    PromptPart::with_kind("field", move |data| match data.get(&key)? {
        Value::String(text) => Ok(text.clone()),
        scalar @ (Value::Number(_) | Value::Bool(_)) => Ok(scalar.to_string()),
        _ => Err(Error::invalid_field(&key, "a string, number or boolean")),
    })
}

/// A part that renders a message list (or a [`ChatHistory`]) stored under
/// `key` via [`history_to_text`]. A `null` field renders as empty text.
pub fn history_part(key: impl Into<String>, last: usize) -> PromptPart {
    let key = key.into();
    PromptPart::with_kind("history", move |data| {
        let messages: Vec<Message> = match data.get(&key)? {
            Value::Null => return Ok(String::new()),
            Value::Object(_) => data.parse::<ChatHistory>(&key)?.messages,
            _ => data.parse(&key)?,
        };
        Ok(history_to_text(&messages, last))
    })
}

// ── Rendering ──────────────────────────────────────────────────────

/// Render every part in order against the same data, concatenate, and trim
/// the result. The first failing part aborts rendering.
pub fn create_prompt(data: &PromptData, parts: &[PromptPart]) -> Result<String> {
    let mut prompt = String::new();
    for part in parts {
        prompt.push_str(&part.render(data)?);
    }
    Ok(prompt.trim().to_string())
}

/// Format the last `last` messages as `"{role}: {content}"` lines.
///
/// `last == 0` renders the whole history.
pub fn history_to_text(history: &[Message], last: usize) -> String {
    let start = if last == 0 {
        0
    } else {
        history.len().saturating_sub(last)
    };
    history[start..]
        .iter()
        .map(|msg| format!("{}: {}", msg.role(), msg.content()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
