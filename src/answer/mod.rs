//! Transcript-grounded answer generation.
//!
//! One chat-completion request per question: a fixed instruction, the episode
//! preamble, the full transcript text, and the question. The model's first
//! choice is returned verbatim; the caller decides what to do with it.

use crate::config::{Credentials, Prompts};
use crate::error::{Result, SporError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Trait for answer generation.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Generate an answer to the question, grounded in the transcript text.
    async fn generate(
        &self,
        question: &str,
        context_preamble: &str,
        transcript_text: &str,
    ) -> Result<String>;
}

/// Chat-completion wrapper for answering questions about the episode.
pub struct AnswerGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    prompts: Prompts,
}

impl AnswerGenerator {
    /// Create a new answer generator.
    ///
    /// Fails before any request is attempted when the credentials carry no
    /// API key.
    pub fn new(credentials: &Credentials, model: &str, prompts: Prompts) -> Result<Self> {
        Ok(Self {
            client: create_client(credentials)?,
            model: model.to_string(),
            prompts,
        })
    }

    /// Render the full prompt for a question.
    pub fn build_prompt(
        &self,
        question: &str,
        context_preamble: &str,
        transcript_text: &str,
    ) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("preamble".to_string(), context_preamble.to_string());
        vars.insert("transcript".to_string(), transcript_text.to_string());

        let body = Prompts::render(&self.prompts.answer.user, &vars);
        format!("{}\n{}", self.prompts.answer.instruction, body)
    }
}

#[async_trait]
impl Answerer for AnswerGenerator {
    /// Generate an answer grounded in the full transcript.
    #[instrument(skip(self, context_preamble, transcript_text), fields(question = %question))]
    async fn generate(
        &self,
        question: &str,
        context_preamble: &str,
        transcript_text: &str,
    ) -> Result<String> {
        let prompt = self.build_prompt(question, context_preamble, transcript_text);
        debug!("Prompt is {} characters", prompt.len());

        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| SporError::Answer(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| SporError::Answer(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SporError::OpenAI(format!("Failed to generate answer: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .ok_or_else(|| SporError::Answer("Empty response from model".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_credentials_before_any_request() {
        let result = AnswerGenerator::new(&Credentials::default(), "gpt-4o", Prompts::default());
        assert!(matches!(result, Err(SporError::Credentials(_))));
    }

    #[test]
    fn test_prompt_contains_transcript_and_question() {
        let generator = AnswerGenerator::new(
            &Credentials::with_openai_key("sk-test"),
            "gpt-4o",
            Prompts::default(),
        )
        .unwrap();

        let prompt = generator.build_prompt(
            "what is chess",
            "A show about games.",
            "A : Chess is hard",
        );

        assert!(prompt.contains("what is chess"));
        assert!(prompt.contains("A show about games."));
        assert!(prompt.contains("A : Chess is hard"));
        assert!(prompt.contains("Read the whole transcript"));
    }
}
