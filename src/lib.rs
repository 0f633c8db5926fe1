//! Spor - Podcast Q&A with timestamped citations
//!
//! Ask a question about a podcast episode and get an answer grounded in the
//! transcript, together with clickable YouTube timestamps pointing at the
//! moments the answer came from.
//!
//! The name "Spor" comes from the Norwegian word for "trace" or "track."
//!
//! # Overview
//!
//! Spor lets you:
//! - Build a persisted vector index over an episode transcript
//! - Ask questions and get answers cited back to timestamps in the video
//! - Search the transcript semantically
//! - Serve a single-page web UI for the same
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `transcript` - Static transcript loading
//! - `embedding` - Embedding generation
//! - `index` - Persisted vector index over the transcript
//! - `answer` - Transcript-grounded answer generation
//! - `citations` - Retrieval and timestamped link formatting
//! - `pipeline` - Question-to-links coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use spor::config::Settings;
//! use spor::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings).await?;
//!
//!     let outcome = pipeline.ask("What is zugzwang").await?;
//!     println!("{}", outcome.answer);
//!     for link in &outcome.links {
//!         println!("{}", link.url);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod citations;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod pipeline;
pub mod transcript;

pub use error::{Result, SporError};
