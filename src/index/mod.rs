//! Vector index over the transcript.
//!
//! Provides a trait-based interface for the persisted index so any backend
//! can be substituted without touching the pipeline logic.

mod builder;
mod file;
mod sqlite;

pub use builder::ensure_index;
pub use file::FileIndex;
pub use sqlite::SqliteIndex;

use crate::error::Result;
use crate::transcript::Utterance;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An utterance as stored in the index, with its embedding.
///
/// Derived 1:1 from a transcript utterance at build time and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedUtterance {
    /// Unique document ID.
    pub id: Uuid,
    /// Who is speaking.
    pub speaker: String,
    /// Indexed text, `"{speaker} : {text}"`.
    pub content: String,
    /// Start offset in the episode, milliseconds.
    pub start_ms: u64,
    /// End offset in the episode, milliseconds.
    pub end_ms: u64,
    /// Position in the transcript sequence.
    pub position: usize,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl IndexedUtterance {
    /// Derive an indexed utterance from its transcript source.
    pub fn from_utterance(utterance: &Utterance, position: usize, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: utterance.speaker.clone(),
            content: utterance.indexed_text(),
            start_ms: utterance.start_ms,
            end_ms: utterance.end_ms,
            position,
            embedding,
        }
    }
}

/// A retrieval result with similarity score.
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// The matched utterance.
    pub document: IndexedUtterance,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Metadata persisted alongside the index.
///
/// The fingerprint and embedding model let `ensure_index` decide whether a
/// stored index still matches the current transcript and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    /// SHA-256 fingerprint of the transcript the index was built from.
    pub fingerprint: String,
    /// Embedding model the vectors came from.
    pub embedding_model: String,
    /// Embedding dimensions.
    pub dimensions: usize,
    /// Number of indexed utterances.
    pub document_count: usize,
    /// When the index was built.
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    /// Whether a stored index can serve the given transcript and model.
    pub fn matches(&self, fingerprint: &str, embedding_model: &str) -> bool {
        self.fingerprint == fingerprint && self.embedding_model == embedding_model
    }
}

/// Trait for index backends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-k most similar utterances for a query embedding, by descending
    /// score. Order among exact score ties is unconstrained.
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<Retrieval>>;

    /// Number of indexed utterances.
    async fn document_count(&self) -> Result<usize>;

    /// The manifest recorded when the index was built.
    fn manifest(&self) -> &IndexManifest;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Rank documents against a query embedding and keep the top k.
pub(crate) fn rank(
    documents: impl Iterator<Item = IndexedUtterance>,
    query_embedding: &[f32],
    top_k: usize,
) -> Vec<Retrieval> {
    let mut results: Vec<Retrieval> = documents
        .map(|document| {
            let score = cosine_similarity(query_embedding, &document.embedding);
            Retrieval { document, score }
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(top_k);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_metadata_survives_derivation() {
        let utterance = Utterance {
            speaker: "A".to_string(),
            text: "Chess is hard".to_string(),
            start_ms: 1234,
            end_ms: 5678,
        };

        let doc = IndexedUtterance::from_utterance(&utterance, 7, vec![1.0, 0.0]);
        assert_eq!(doc.start_ms, 1234);
        assert_eq!(doc.end_ms, 5678);
        assert_eq!(doc.position, 7);
        assert_eq!(doc.content, "A : Chess is hard");
    }

    #[test]
    fn test_rank_orders_by_descending_score() {
        let make = |start_ms: u64, embedding: Vec<f32>| IndexedUtterance {
            id: Uuid::new_v4(),
            speaker: "A".to_string(),
            content: "A : x".to_string(),
            start_ms,
            end_ms: start_ms + 1000,
            position: 0,
            embedding,
        };

        let docs = vec![
            make(0, vec![0.0, 1.0]),
            make(1000, vec![1.0, 0.0]),
            make(2000, vec![1.0, 1.0]),
        ];

        let results = rank(docs.into_iter(), &[1.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.start_ms, 1000);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_manifest_matching() {
        let manifest = IndexManifest {
            fingerprint: "abc".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            document_count: 10,
            built_at: Utc::now(),
        };

        assert!(manifest.matches("abc", "text-embedding-3-small"));
        assert!(!manifest.matches("def", "text-embedding-3-small"));
        assert!(!manifest.matches("abc", "text-embedding-3-large"));
    }
}
