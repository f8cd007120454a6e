//! Error type shared by every layer of the crate.
//!
//! Failures surface to the immediate caller. Nothing in the crate retries or
//! swallows an error.

use thiserror::Error;

/// Errors produced while validating parameters, rendering prompts, or
/// invoking a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Out-of-range or mutually exclusive generation parameters.
    #[error("invalid generation config: {0}")]
    Validation(String),

    /// No prompt data is bound, or a prompt part references an absent field.
    #[error("missing prompt data: {0}")]
    MissingData(String),

    /// A field is present but holds a value of the wrong JSON type.
    #[error("field '{field}' is not {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    /// The model client failed. The message is the client's own.
    #[error("{0}")]
    Invocation(String),

    /// A template file could not be read or parsed.
    #[error("template error: {0}")]
    Template(String),
}

impl Error {
    pub(crate) fn missing_field(field: &str) -> Self {
        Error::MissingData(format!("field '{field}' not found"))
    }

    pub(crate) fn invalid_field(field: &str, expected: &'static str) -> Self {
        Error::InvalidField {
            field: field.to_string(),
            expected,
        }
    }
}

/// Result type alias for parley operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_the_key() {
        let err = Error::missing_field("user_query");
        assert_eq!(err.to_string(), "missing prompt data: field 'user_query' not found");
    }

    #[test]
    fn invalid_field_names_expected_type() {
        let err = Error::invalid_field("docs", "a list");
        assert_eq!(err.to_string(), "field 'docs' is not a list");
    }

    #[test]
    fn invocation_message_is_verbatim() {
        let err = Error::Invocation("OpenRouter API HTTP 500: boom".into());
        assert_eq!(err.to_string(), "OpenRouter API HTTP 500: boom");
    }
}
