//! Declarative templates loaded from JSON.
//!
//! A template file lists prompt parts in order:
//!
//! ```json
//! {
//!   "parts": [
//!     { "type": "text", "text": "You are a support agent.\n" },
//!     { "type": "if", "field": "history",
//!       "then": { "type": "history", "field": "history", "last": 6 } },
//!     { "type": "text", "text": "\nQuestion: " },
//!     { "type": "field", "field": "question" }
//!   ]
//! }
//! ```
//!
//! [`TemplateFile::compile`] turns it into the same [`PromptPart`]s the
//! combinators in [`parts`](super::parts) build by hand.

use super::data::PromptData;
use super::parts::{
    Content, DEFAULT_HISTORY_WINDOW, PromptPart, conditional_part, field_part, history_part,
    static_part,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// A template: an ordered list of part definitions.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TemplateFile {
    pub parts: Vec<PartDef>,
}

/// One declarative part.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PartDef {
    /// Literal text.
    Text { text: String },
    /// A scalar field rendered verbatim.
    Field { field: String },
    /// `then` when `field` is truthy, else `else` (empty when omitted).
    If {
        field: String,
        then: Box<PartDef>,
        #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<PartDef>>,
    },
    /// The last `last` messages of a history field.
    History {
        field: String,
        #[serde(default = "default_history_window")]
        last: usize,
    },
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

impl TemplateFile {
    /// Parse a template from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Template(format!("invalid template: {e}")))
    }

    /// Read and parse a template file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Template(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Build the prompt parts this template describes.
    pub fn compile(&self) -> Vec<PromptPart> {
        self.parts.iter().map(PartDef::compile).collect()
    }
}

impl PartDef {
    pub fn compile(&self) -> PromptPart {
        match self {
            PartDef::Text { text } => static_part(text.as_str()),
            PartDef::Field { field } => field_part(field.as_str()),
            PartDef::History { field, last } => history_part(field.as_str(), *last),
            PartDef::If {
                field,
                then,
                otherwise,
            } => {
                let field = field.clone();
                let then = then.compile();
                let otherwise = otherwise.as_ref().map(|part| part.compile());
                conditional_part(
                    move |data: &PromptData| Ok(is_truthy(data.get(&field)?)),
                    part_content(then),
                    otherwise.map_or_else(Content::empty, part_content),
                )
            }
        }
    }
}

fn part_content(part: PromptPart) -> Content {
    super::parts::generated(move |data| part.render(data))
}

/// `null`, `false`, `0`, and empty strings/lists/objects are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::prompt::create_prompt;
    use serde_json::json;
    use std::io::Write;

    const SUPPORT_TEMPLATE: &str = r#"{
        "parts": [
            {"type": "text", "text": "You are a support agent.\n"},
            {"type": "if", "field": "history",
             "then": {"type": "history", "field": "history", "last": 1},
             "else": {"type": "text", "text": "New conversation."}},
            {"type": "text", "text": "\nQuestion: "},
            {"type": "field", "field": "question"}
        ]
    }"#;

    #[test]
    fn parses_all_part_types() {
        let template = TemplateFile::from_json(SUPPORT_TEMPLATE).unwrap();
        assert_eq!(template.parts.len(), 4);
        assert!(matches!(template.parts[1], PartDef::If { .. }));
    }

    #[test]
    fn history_window_defaults() {
        let template =
            TemplateFile::from_json(r#"{"parts": [{"type": "history", "field": "h"}]}"#).unwrap();
        assert_eq!(
            template.parts[0],
            PartDef::History {
                field: "h".into(),
                last: DEFAULT_HISTORY_WINDOW
            }
        );
    }

    #[test]
    fn compiled_template_renders_like_hand_built_parts() {
        let parts = TemplateFile::from_json(SUPPORT_TEMPLATE).unwrap().compile();

        let fresh = PromptData::from_value(json!({"history": [], "question": "Refund?"})).unwrap();
        assert_eq!(
            create_prompt(&fresh, &parts).unwrap(),
            "You are a support agent.\nNew conversation.\nQuestion: Refund?"
        );

        let ongoing = PromptData::from_value(json!({
            "history": [{"role": "user", "content": "hi"}, {"role": "assistant", "content": "hello"}],
            "question": "Refund?"
        }))
        .unwrap();
        assert_eq!(
            create_prompt(&ongoing, &parts).unwrap(),
            "You are a support agent.\nassistant: hello\nQuestion: Refund?"
        );
    }

    #[test]
    fn if_on_absent_field_fails() {
        let parts = TemplateFile::from_json(SUPPORT_TEMPLATE).unwrap().compile();
        let data = PromptData::from_value(json!({"question": "x"})).unwrap();
        assert!(matches!(create_prompt(&data, &parts), Err(Error::MissingData(_))));
    }

    #[test]
    fn unknown_part_type_rejected() {
        let err = TemplateFile::from_json(r#"{"parts": [{"type": "loop"}]}"#).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SUPPORT_TEMPLATE.as_bytes()).unwrap();
        let template = TemplateFile::load(file.path()).unwrap();
        assert_eq!(template.compile().len(), 4);
    }

    #[test]
    fn load_missing_file_is_template_error() {
        let err = TemplateFile::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(2)));
        assert!(is_truthy(&json!(["x"])));
    }
}
