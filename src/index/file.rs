//! File-backed index implementation.
//!
//! Persists the documents and manifest as JSON under a directory. Good
//! enough for a single episode; the sqlite backend exists for anything
//! bigger.

use super::{rank, IndexManifest, IndexedUtterance, Retrieval, VectorIndex};
use crate::error::{Result, SporError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

const MANIFEST_FILE: &str = "manifest.json";
const DOCUMENTS_FILE: &str = "documents.json";

/// JSON-file index.
pub struct FileIndex {
    manifest: IndexManifest,
    documents: Vec<IndexedUtterance>,
}

impl FileIndex {
    /// Whether a persisted index exists under the directory.
    pub fn exists(dir: &Path) -> bool {
        dir.join(MANIFEST_FILE).exists() && dir.join(DOCUMENTS_FILE).exists()
    }

    /// Build an index in memory and persist it under the directory.
    #[instrument(skip(documents, manifest), fields(count = documents.len()))]
    pub fn create(dir: &Path, documents: Vec<IndexedUtterance>, manifest: IndexManifest) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        let documents_json = serde_json::to_string(&documents)?;

        std::fs::write(dir.join(MANIFEST_FILE), manifest_json)?;
        std::fs::write(dir.join(DOCUMENTS_FILE), documents_json)?;

        info!("Persisted index with {} documents to {:?}", documents.len(), dir);

        Ok(Self { manifest, documents })
    }

    /// Load a persisted index from the directory.
    #[instrument]
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest = Self::load_manifest(dir)?;

        let documents_path = dir.join(DOCUMENTS_FILE);
        let documents_json = std::fs::read_to_string(&documents_path)
            .map_err(|e| index_error(&documents_path, e))?;
        let documents: Vec<IndexedUtterance> = serde_json::from_str(&documents_json)
            .map_err(|e| SporError::Index(format!("corrupt index at {:?}: {}", documents_path, e)))?;

        if documents.len() != manifest.document_count {
            return Err(SporError::Index(format!(
                "index at {:?} holds {} documents but the manifest says {}",
                dir,
                documents.len(),
                manifest.document_count
            )));
        }

        debug!("Loaded index with {} documents from {:?}", documents.len(), dir);

        Ok(Self { manifest, documents })
    }

    /// Read only the manifest, without loading the documents.
    pub fn load_manifest(dir: &Path) -> Result<IndexManifest> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest_json =
            std::fs::read_to_string(&manifest_path).map_err(|e| index_error(&manifest_path, e))?;
        serde_json::from_str(&manifest_json)
            .map_err(|e| SporError::Index(format!("corrupt manifest at {:?}: {}", manifest_path, e)))
    }
}

fn index_error(path: &PathBuf, e: std::io::Error) -> SporError {
    SporError::Index(format!("cannot read {:?}: {}", path, e))
}

#[async_trait]
impl VectorIndex for FileIndex {
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<Retrieval>> {
        Ok(rank(self.documents.iter().cloned(), query_embedding, top_k))
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.documents.len())
    }

    fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Utterance;
    use chrono::Utc;

    fn sample_documents() -> Vec<IndexedUtterance> {
        let utterances = vec![
            Utterance {
                speaker: "A".to_string(),
                text: "Chess is hard".to_string(),
                start_ms: 0,
                end_ms: 2000,
            },
            Utterance {
                speaker: "B".to_string(),
                text: "Tennis is fun".to_string(),
                start_ms: 2000,
                end_ms: 4000,
            },
        ];

        let embeddings = [vec![1.0, 0.0], vec![0.0, 1.0]];
        utterances
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (u, e))| IndexedUtterance::from_utterance(u, i, e))
            .collect()
    }

    fn sample_manifest(count: usize) -> IndexManifest {
        IndexManifest {
            fingerprint: "abc".to_string(),
            embedding_model: "stub".to_string(),
            dimensions: 2,
            document_count: count,
            built_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_persist_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");

        assert!(!FileIndex::exists(&path));

        let documents = sample_documents();
        FileIndex::create(&path, documents, sample_manifest(2)).unwrap();
        assert!(FileIndex::exists(&path));

        let loaded = FileIndex::load(&path).unwrap();
        assert_eq!(loaded.document_count().await.unwrap(), 2);
        assert!(loaded.manifest().matches("abc", "stub"));

        let results = loaded.search(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "A : Chess is hard");
        assert_eq!(results[0].document.start_ms, 0);
    }

    #[tokio::test]
    async fn test_load_rejects_document_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");

        FileIndex::create(&path, sample_documents(), sample_manifest(3)).unwrap();
        assert!(matches!(FileIndex::load(&path), Err(SporError::Index(_))));
    }

    #[test]
    fn test_load_missing_index_is_an_index_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileIndex::load(&dir.path().join("nope"));
        assert!(matches!(result, Err(SporError::Index(_))));
    }
}
