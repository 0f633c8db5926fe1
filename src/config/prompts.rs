//! Prompt templates for Spor.
//!
//! Prompts can be customized by placing TOML files in the custom prompts
//! directory named in the configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
}


/// Prompts for transcript-grounded answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    /// Fixed instructional preamble prepended to every request.
    pub instruction: String,
    /// User template; sees {{question}}, {{preamble}} and {{transcript}}.
    pub user: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            instruction: "Todo: \n Read the whole transcript provided. Answer in 3-4 line \
                about the question asked. Answer only from the transcript provided and who \
                mentioned the topic"
                .to_string(),

            user: r#"Question:
{{question}}

Podcast:
{{preamble}}

Transcript:
{{transcript}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional overrides from a custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.answer.instruction.contains("transcript"));
        assert!(prompts.answer.user.contains("{{question}}"));
        assert!(prompts.answer.user.contains("{{transcript}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Question:\n{{question}}\n\nTranscript:\n{{transcript}}";
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is zugzwang".to_string());
        vars.insert("transcript".to_string(), "Zugzwang is a German word.".to_string());

        let result = Prompts::render(template, &vars);
        assert!(result.contains("What is zugzwang"));
        assert!(result.contains("Zugzwang is a German word."));
        assert!(!result.contains("{{"));
    }
}
