//! Prompt assembly: data, parts, and declarative templates.
//!
//! The pieces fit together in three layers:
//!
//! 1. **[`PromptData`]**: the named fields a prompt is rendered from. Owned by
//!    one agent, or shared across a pipeline through [`SharedPromptData`].
//!
//! 2. **[`PromptPart`]**: pure functions from data to text, built with
//!    [`static_part`], [`conditional_part`], [`when`], [`field_part`] and
//!    [`history_part`], and joined by [`create_prompt`].
//!
//! 3. **[`TemplateFile`]**: a JSON description of a part list, compiled into
//!    [`PromptPart`]s. Used by the `parley` binary.

pub mod data;
pub mod parts;
pub mod template;

pub use data::{PromptData, PromptDataBinding, SharedPromptData};
pub use parts::{
    Condition, Content, DEFAULT_HISTORY_WINDOW, Generator, PromptPart, conditional_part,
    create_prompt, field_part, generated, history_part, history_to_text, static_part, when,
};
pub use template::{PartDef, TemplateFile};
