//! Question-to-links pipeline.
//!
//! Wires the transcript, embedder, index, and answer generator together.
//! Each `ask` is a stateless single pass: generate an answer grounded in the
//! full transcript, retrieve the transcript segments most similar to that
//! answer, and turn the ones above the threshold into timestamped links.

use crate::answer::{Answerer, AnswerGenerator};
use crate::citations::{self, TimestampLink};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::index::{ensure_index, Retrieval, VectorIndex};
use crate::transcript::Transcript;
use std::sync::Arc;
use tracing::{info, instrument};

/// The assembled question-answering pipeline.
pub struct Pipeline {
    settings: Settings,
    transcript: Transcript,
    embedder: Arc<dyn Embedder>,
    answerer: Arc<dyn Answerer>,
    index: Arc<dyn VectorIndex>,
}

impl Pipeline {
    /// Assemble the pipeline from settings.
    ///
    /// Loads the transcript, constructs the OpenAI-backed components from the
    /// credentials carried in the settings, and ensures the persisted index
    /// exists (embedding every utterance on first run).
    pub async fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let transcript = match &settings.episode.transcript_path {
            Some(path) => Transcript::from_file(&Settings::expand_path(path))?,
            None => Transcript::embedded()?,
        };
        info!("Loaded transcript with {} utterances", transcript.len());

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(
            &settings.credentials,
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )?);

        let answerer: Arc<dyn Answerer> = Arc::new(AnswerGenerator::new(
            &settings.credentials,
            &settings.answer.model,
            prompts,
        )?);

        let index = ensure_index(&transcript, embedder.as_ref(), &settings).await?;

        Ok(Self {
            settings,
            transcript,
            embedder,
            answerer,
            index,
        })
    }

    /// Assemble a pipeline from explicit components.
    pub async fn with_components(
        settings: Settings,
        transcript: Transcript,
        embedder: Arc<dyn Embedder>,
        answerer: Arc<dyn Answerer>,
    ) -> Result<Self> {
        let index = ensure_index(&transcript, embedder.as_ref(), &settings).await?;
        Ok(Self {
            settings,
            transcript,
            embedder,
            answerer,
            index,
        })
    }

    /// Answer a question and cite where in the episode it came from.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<AskOutcome> {
        if question.trim().is_empty() {
            return Err(crate::error::SporError::InvalidInput(
                "the question is empty".to_string(),
            ));
        }

        let answer = self
            .answerer
            .generate(
                question,
                &self.settings.episode.context_preamble,
                &self.transcript.full_text(),
            )
            .await?;

        // The answer itself becomes the retrieval query.
        let results = citations::retrieve(
            self.index.as_ref(),
            self.embedder.as_ref(),
            &answer,
            self.settings.retrieval.top_k,
        )
        .await?;

        let links = citations::format_links(
            &results,
            self.settings.retrieval.link_threshold,
            &self.settings.episode.video_id,
        );

        info!("Answered with {} links", links.len());

        Ok(AskOutcome {
            question: question.to_string(),
            answer,
            links,
        })
    }

    /// Raw similarity search over the index, without the answer step.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Retrieval>> {
        citations::retrieve(self.index.as_ref(), self.embedder.as_ref(), query, limit).await
    }

    /// The settings the pipeline was assembled with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The loaded transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The index behind the pipeline.
    pub fn index(&self) -> Arc<dyn VectorIndex> {
        self.index.clone()
    }
}

/// Result of asking a question.
#[derive(Debug, Clone)]
pub struct AskOutcome {
    /// The question as asked.
    pub question: String,
    /// The generated answer.
    pub answer: String,
    /// Timestamped links into the episode, descending by similarity.
    pub links: Vec<TimestampLink>,
}
