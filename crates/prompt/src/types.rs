//! Prompt types for docqa.

use serde::{Deserialize, Serialize};

/// Identifier of the built-in answer prompt.
pub const ANSWER_PROMPT_ID: &str = "docqa.answer.default";

/// Built-in template combining instruction, context and question.
pub const ANSWER_PROMPT_TEMPLATE: &str = "Answer this question in detail using the given context.\n\n\
Context:\n{{context}}\n\n\
Question: {{question}}\n\n\
Answer:";

/// A prompt definition, either built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Optional system message sent alongside the rendered template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax (`{{context}}`, `{{question}}`)
    pub template: String,
}

impl PromptDefinition {
    /// The built-in answer prompt.
    pub fn default_answer() -> Self {
        Self {
            id: ANSWER_PROMPT_ID.to_string(),
            title: "Answer from document context".to_string(),
            api_version: "1.0".to_string(),
            system: None,
            template: ANSWER_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,
}
