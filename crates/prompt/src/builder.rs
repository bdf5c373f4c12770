//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// # Example
/// ```
/// use docqa_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "Where did the cat sit?".to_string());
/// vars.insert("context".to_string(), "The cat sat on the mat.".to_string());
///
/// let built = build_prompt(&PromptDefinition::default_answer(), vars).unwrap();
/// assert!(built.user.contains("Question: Where did the cat sit?"));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        system: definition.system.clone(),
        user,
        source_prompt_id: definition.id.clone(),
    })
}

/// Build the answer prompt for a question and its retrieved context.
pub fn build_answer_prompt(
    definition: &PromptDefinition,
    question: &str,
    context: &str,
) -> AppResult<BuiltPrompt> {
    let mut variables = HashMap::new();
    variables.insert("question".to_string(), question.to_string());
    variables.insert("context".to_string(), context.to_string());
    build_prompt(definition, variables)
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars);
        assert_eq!(result.unwrap(), "Question: Hello, world!");
    }

    #[test]
    fn test_answer_prompt_layout() {
        let built = build_answer_prompt(
            &PromptDefinition::default_answer(),
            "Where did the cat sit?",
            "The cat sat on the mat.",
        )
        .unwrap();

        assert_eq!(
            built.user,
            "Answer this question in detail using the given context.\n\n\
             Context:\nThe cat sat on the mat.\n\n\
             Question: Where did the cat sit?\n\nAnswer:"
        );
        assert_eq!(built.source_prompt_id, "docqa.answer.default");
        assert!(built.system.is_none());
    }

    #[test]
    fn test_no_html_escaping() {
        let built = build_answer_prompt(
            &PromptDefinition::default_answer(),
            "Is 3 < 4 & 5 > 2?",
            "x <b>y</b>",
        )
        .unwrap();
        assert!(built.user.contains("Is 3 < 4 & 5 > 2?"));
        assert!(built.user.contains("x <b>y</b>"));
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        // Handlebars renders missing variables as empty string
        assert_eq!(render_template("Q: {{missing}}", &vars).unwrap(), "Q: ");
    }
}
