//! Index construction and loading.
//!
//! `ensure_index` is the one entry point: it loads a persisted index when one
//! exists and still matches the transcript, and embeds + builds + persists
//! otherwise.

use super::{FileIndex, IndexManifest, IndexedUtterance, SqliteIndex, VectorIndex};
use crate::config::{IndexProvider, Settings};
use crate::embedding::Embedder;
use crate::error::{Result, SporError};
use crate::transcript::Transcript;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Load the persisted index for the transcript, building it first if it is
/// absent or stale.
///
/// A loaded index performs no embedding calls. A stored index whose
/// fingerprint or embedding model no longer matches is rebuilt with a
/// warning rather than silently serving stale segments.
#[instrument(skip_all, fields(provider = %settings.index.provider))]
pub async fn ensure_index(
    transcript: &Transcript,
    embedder: &dyn Embedder,
    settings: &Settings,
) -> Result<Arc<dyn VectorIndex>> {
    let fingerprint = transcript.fingerprint();

    match settings.index.provider {
        IndexProvider::File => {
            let dir = settings.index_dir();

            if FileIndex::exists(&dir) {
                let manifest = FileIndex::load_manifest(&dir)?;
                if manifest.matches(&fingerprint, embedder.model_id()) {
                    info!("Loading persisted index from {:?}", dir);
                    return Ok(Arc::new(FileIndex::load(&dir)?));
                }
                warn!(
                    "Persisted index at {:?} does not match the current transcript or \
                     embedding model, rebuilding",
                    dir
                );
            }

            let (documents, manifest) = build_documents(transcript, embedder, fingerprint).await?;
            Ok(Arc::new(FileIndex::create(&dir, documents, manifest)?))
        }

        IndexProvider::Sqlite => {
            let path = settings.sqlite_path();

            if SqliteIndex::exists(&path) {
                if let Some(manifest) = SqliteIndex::load_manifest(&path)? {
                    if manifest.matches(&fingerprint, embedder.model_id()) {
                        info!("Loading persisted index from {:?}", path);
                        return Ok(Arc::new(SqliteIndex::load(&path)?));
                    }
                    warn!(
                        "Persisted index at {:?} does not match the current transcript or \
                         embedding model, rebuilding",
                        path
                    );
                }
            }

            let (documents, manifest) = build_documents(transcript, embedder, fingerprint).await?;
            Ok(Arc::new(SqliteIndex::create(&path, documents, manifest)?))
        }
    }
}

/// Embed every utterance and assemble the documents plus manifest.
async fn build_documents(
    transcript: &Transcript,
    embedder: &dyn Embedder,
    fingerprint: String,
) -> Result<(Vec<IndexedUtterance>, IndexManifest)> {
    info!("Building index for {} utterances", transcript.len());

    let texts: Vec<String> = transcript
        .utterances()
        .iter()
        .map(|u| u.indexed_text())
        .collect();

    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != texts.len() {
        return Err(SporError::Embedding(format!(
            "expected {} embeddings, got {}",
            texts.len(),
            embeddings.len()
        )));
    }

    let documents: Vec<IndexedUtterance> = transcript
        .utterances()
        .iter()
        .zip(embeddings)
        .enumerate()
        .map(|(position, (utterance, embedding))| {
            IndexedUtterance::from_utterance(utterance, position, embedding)
        })
        .collect();

    let manifest = IndexManifest {
        fingerprint,
        embedding_model: embedder.model_id().to_string(),
        dimensions: embedder.dimensions(),
        document_count: documents.len(),
        built_at: Utc::now(),
    };

    Ok((documents, manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Utterance;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder that counts how often it is called.
    struct StubEmbedder {
        calls: AtomicUsize,
    }

    impl StubEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn vector_for(text: &str) -> Vec<f32> {
            let sum: u32 = text.bytes().map(u32::from).sum();
            vec![(sum % 97) as f32, (sum % 89) as f32, 1.0]
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::vector_for(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_id(&self) -> &str {
            "stub"
        }
    }

    fn transcript(texts: &[&str]) -> Transcript {
        let utterances = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Utterance {
                speaker: "A".to_string(),
                text: text.to_string(),
                start_ms: i as u64 * 1000,
                end_ms: (i as u64 + 1) * 1000,
            })
            .collect();
        Transcript::new(utterances).unwrap()
    }

    fn settings_with_dir(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.index.dir = dir.join("index").to_string_lossy().into_owned();
        settings.index.sqlite_path = dir.join("index.db").to_string_lossy().into_owned();
        settings
    }

    #[tokio::test]
    async fn test_second_ensure_does_not_re_embed() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_dir(dir.path());
        let transcript = transcript(&["Chess is hard", "Tennis is fun"]);

        let embedder = StubEmbedder::new();
        let index = ensure_index(&transcript, &embedder, &settings).await.unwrap();
        assert_eq!(index.document_count().await.unwrap(), 2);
        assert_eq!(embedder.call_count(), 1);

        // Fresh embedder: a load must not invoke it at all.
        let embedder = StubEmbedder::new();
        let index = ensure_index(&transcript, &embedder, &settings).await.unwrap();
        assert_eq!(index.document_count().await.unwrap(), 2);
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_changed_transcript_triggers_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_dir(dir.path());

        let embedder = StubEmbedder::new();
        ensure_index(&transcript(&["Chess is hard"]), &embedder, &settings)
            .await
            .unwrap();
        assert_eq!(embedder.call_count(), 1);

        let embedder = StubEmbedder::new();
        let index = ensure_index(&transcript(&["Chess is hard", "And slow"]), &embedder, &settings)
            .await
            .unwrap();
        assert_eq!(embedder.call_count(), 1);
        assert_eq!(index.document_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sqlite_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_with_dir(dir.path());
        settings.index.provider = IndexProvider::Sqlite;

        let transcript = transcript(&["Chess is hard", "Tennis is fun"]);

        let embedder = StubEmbedder::new();
        ensure_index(&transcript, &embedder, &settings).await.unwrap();
        assert_eq!(embedder.call_count(), 1);

        let embedder = StubEmbedder::new();
        let index = ensure_index(&transcript, &embedder, &settings).await.unwrap();
        assert_eq!(embedder.call_count(), 0);

        let query = StubEmbedder::vector_for("A : Chess is hard");
        let results = index.search(&query, 1).await.unwrap();
        assert_eq!(results[0].document.content, "A : Chess is hard");
    }

    #[tokio::test]
    async fn test_document_metadata_matches_source() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_dir(dir.path());
        let transcript = transcript(&["one", "two", "three"]);

        let embedder = StubEmbedder::new();
        let index = ensure_index(&transcript, &embedder, &settings).await.unwrap();

        // Every utterance must surface with its exact start/end millis.
        for (position, utterance) in transcript.utterances().iter().enumerate() {
            let query = StubEmbedder::vector_for(&utterance.indexed_text());
            let results = index.search(&query, 3).await.unwrap();
            let hit = results
                .iter()
                .find(|r| r.document.position == position)
                .unwrap();
            assert_eq!(hit.document.start_ms, utterance.start_ms);
            assert_eq!(hit.document.end_ms, utterance.end_ms);
        }
    }
}
