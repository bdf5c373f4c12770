//! Prompt system for docqa.
//!
//! This crate renders the prompt handed to the generative answer strategy:
//! - Built-in answer prompt definition
//! - YAML-based prompt definitions that override it
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_answer_prompt, build_prompt};
pub use loader::load_prompt_file;
pub use types::{BuiltPrompt, PromptDefinition};
