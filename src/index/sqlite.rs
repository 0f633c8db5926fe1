//! SQLite-backed index implementation.
//!
//! Similarity is computed in Rust over all stored rows, which is fine at
//! transcript scale. Swap in sqlite-vec or a dedicated vector database if
//! an episode library ever outgrows this.

use super::{rank, IndexManifest, IndexedUtterance, Retrieval, VectorIndex};
use crate::error::{Result, SporError};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// SQLite index.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
    manifest: IndexManifest,
}

impl SqliteIndex {
    /// Whether a database exists at the path.
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Build the index from documents and persist it at the path, replacing
    /// anything already stored there.
    #[instrument(skip(documents, manifest), fields(count = documents.len()))]
    pub fn create(
        path: &Path,
        documents: Vec<IndexedUtterance>,
        manifest: IndexManifest,
    ) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM documents", [])?;
        for doc in &documents {
            tx.execute(
                r#"
                INSERT INTO documents (id, speaker, content, start_ms, end_ms, position, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    doc.id.to_string(),
                    doc.speaker,
                    doc.content,
                    doc.start_ms as i64,
                    doc.end_ms as i64,
                    doc.position as i64,
                    embedding_to_bytes(&doc.embedding),
                ],
            )?;
        }

        let manifest_json = serde_json::to_string(&manifest)?;
        tx.execute(
            "INSERT OR REPLACE INTO manifest (id, manifest_json) VALUES (1, ?1)",
            params![manifest_json],
        )?;
        tx.commit()?;

        info!("Persisted index with {} documents to {:?}", documents.len(), path);

        Ok(Self {
            conn: Mutex::new(conn),
            manifest,
        })
    }

    /// Load a persisted index from the path.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        let manifest = Self::read_manifest(&conn)?.ok_or_else(|| {
            SporError::Index(format!("no index has been built at {:?}", path))
        })?;

        debug!("Loaded index manifest from {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            manifest,
        })
    }

    /// Read only the manifest from a database at the path.
    pub fn load_manifest(path: &Path) -> Result<Option<IndexManifest>> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Self::read_manifest(&conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                speaker TEXT NOT NULL,
                content TEXT NOT NULL,
                start_ms INTEGER NOT NULL,
                end_ms INTEGER NOT NULL,
                position INTEGER NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_position ON documents(position);

            CREATE TABLE IF NOT EXISTS manifest (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                manifest_json TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn read_manifest(conn: &Connection) -> Result<Option<IndexManifest>> {
        let result = conn.query_row("SELECT manifest_json FROM manifest WHERE id = 1", [], |row| {
            row.get::<_, String>(0)
        });

        match result {
            Ok(json) => {
                let manifest = serde_json::from_str(&json)
                    .map_err(|e| SporError::Index(format!("corrupt manifest: {}", e)))?;
                Ok(Some(manifest))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Serialize embedding to bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
            f32::from_le_bytes(arr)
        })
        .collect()
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<Retrieval>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SporError::Index(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            "SELECT id, speaker, content, start_ms, end_ms, position, embedding FROM documents",
        )?;

        let docs = stmt.query_map([], |row| {
            let id_str: String = row.get(0)?;
            let start_ms: i64 = row.get(3)?;
            let end_ms: i64 = row.get(4)?;
            let position: i64 = row.get(5)?;
            let embedding_bytes: Vec<u8> = row.get(6)?;

            Ok(IndexedUtterance {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                speaker: row.get(1)?,
                content: row.get(2)?,
                start_ms: start_ms as u64,
                end_ms: end_ms as u64,
                position: position as usize,
                embedding: bytes_to_embedding(&embedding_bytes),
            })
        })?;

        let results = rank(
            docs.filter_map(|doc| doc.ok()),
            query_embedding,
            top_k,
        );

        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SporError::Index(format!("Failed to acquire lock: {}", e)))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }
}
