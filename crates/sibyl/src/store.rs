//! Vector storage backends.
//!
//! One contract, two backends: [`MemoryStore`] holds embedded chunks
//! in process memory and scores queries with a full linear scan;
//! [`PersistentStore`] keeps the same records durable under a
//! `(storage_path, collection_name)` address and survives restarts.
//! Dimensionality is fixed per store instance; ranking ties break by
//! insertion order, earliest first.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use sibyl_core::{Chunk, Error, Result, ScoredChunk};

/// An embedded chunk as stored by a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Trait for vector storage backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts one embedded chunk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the vector's length
    /// differs from the store's dimensionality.
    async fn add(&self, chunk: Chunk, vector: Vec<f32>) -> Result<()>;

    /// Returns up to `top_k` chunks ranked by descending similarity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `top_k` is zero.
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Returns the number of stored chunks.
    async fn count(&self) -> Result<usize>;

    /// Returns the fixed dimensionality of this store.
    fn dimension(&self) -> usize;

    /// Returns a short backend identifier for logging.
    fn backend_name(&self) -> &str;
}

/// In-memory vector store; contents end with the process.
pub struct MemoryStore {
    dimension: usize,
    entries: RwLock<Vec<StoredEntry>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store with the given dimensionality.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn add(&self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        check_dimension(self.dimension, vector.len())?;
        self.entries.write().push(StoredEntry { chunk, vector });
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        rank(&self.entries.read(), query, top_k)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Durable vector store backed by a JSON-lines collection file.
///
/// Records are loaded into memory at open and appended to the file on
/// every insert, so an instance reopened on the same
/// `(storage_path, collection_name)` sees everything written before.
pub struct PersistentStore {
    dimension: usize,
    collection_name: String,
    path: PathBuf,
    entries: RwLock<Vec<StoredEntry>>,
    file: Mutex<File>,
}

impl PersistentStore {
    /// Opens (or creates) the collection under `storage_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendUnavailable`] when the storage
    /// directory cannot be created, the collection file cannot be
    /// opened or parsed, or stored records disagree with `dimension`.
    pub fn open(
        storage_path: impl AsRef<Path>,
        collection_name: &str,
        dimension: usize,
    ) -> Result<Self> {
        let storage_path = storage_path.as_ref();
        std::fs::create_dir_all(storage_path)
            .map_err(|e| Error::backend(collection_name, format!("create storage dir: {e}")))?;

        let path = storage_path.join(format!("{collection_name}.jsonl"));
        let entries = Self::load_entries(&path, collection_name, dimension)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::backend(collection_name, format!("open collection: {e}")))?;

        tracing::info!(
            collection = %collection_name,
            path = %path.display(),
            records = entries.len(),
            "Opened persistent collection"
        );

        Ok(Self {
            dimension,
            collection_name: collection_name.to_string(),
            path,
            entries: RwLock::new(entries),
            file: Mutex::new(file),
        })
    }

    fn load_entries(
        path: &Path,
        collection_name: &str,
        dimension: usize,
    ) -> Result<Vec<StoredEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(
            File::open(path)
                .map_err(|e| Error::backend(collection_name, format!("read collection: {e}")))?,
        );

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line =
                line.map_err(|e| Error::backend(collection_name, format!("read record: {e}")))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: StoredEntry = serde_json::from_str(&line)
                .map_err(|e| Error::backend(collection_name, format!("corrupt record: {e}")))?;
            if entry.vector.len() != dimension {
                return Err(Error::backend(
                    collection_name,
                    format!(
                        "collection holds {}-dimensional vectors, expected {dimension}",
                        entry.vector.len()
                    ),
                ));
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Returns the collection file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VectorStore for PersistentStore {
    async fn add(&self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        check_dimension(self.dimension, vector.len())?;

        let entry = StoredEntry { chunk, vector };
        let line = serde_json::to_string(&entry)?;
        {
            let mut file = self.file.lock();
            writeln!(file, "{line}")?;
            file.flush()?;
        }
        self.entries.write().push(entry);
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        rank(&self.entries.read(), query, top_k)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn backend_name(&self) -> &str {
        &self.collection_name
    }
}

fn check_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}

/// Scores every entry against the query and returns the top `top_k`.
///
/// The sort is stable over insertion-ordered entries, which gives the
/// earliest-inserted chunk precedence on equal scores.
fn rank(entries: &[StoredEntry], query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
    if top_k == 0 {
        return Err(Error::config("top_k must be greater than 0"));
    }

    let mut results: Vec<ScoredChunk> = entries
        .iter()
        .map(|entry| ScoredChunk {
            chunk: entry.chunk.clone(),
            score: cosine_similarity(query, &entry.vector),
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);

    Ok(results)
}

/// Computes cosine similarity between two vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 1e-10 && norm_b > 1e-10 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, index: usize) -> Chunk {
        Chunk::new(text, 0, text.len(), index)
    }

    #[test]
    fn cosine_similarity_basics() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn memory_store_ranks_by_similarity() {
        let store = MemoryStore::new(3);
        store.add(chunk("east", 0), vec![1.0, 0.0, 0.0]).await.unwrap();
        store.add(chunk("north", 1), vec![0.0, 1.0, 0.0]).await.unwrap();
        store
            .add(chunk("northeast", 2), vec![0.7, 0.7, 0.0])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "east");
        assert_eq!(results[1].chunk.text, "northeast");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn memory_store_breaks_ties_by_insertion_order() {
        let store = MemoryStore::new(2);
        store.add(chunk("first", 0), vec![1.0, 0.0]).await.unwrap();
        store.add(chunk("second", 1), vec![1.0, 0.0]).await.unwrap();
        store.add(chunk("third", 2), vec![1.0, 0.0]).await.unwrap();

        let results = store.search(&[1.0, 0.0], 3).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn memory_store_rejects_wrong_dimension() {
        let store = MemoryStore::new(3);
        let result = store.add(chunk("bad", 0), vec![1.0, 0.0]).await;
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn search_rejects_zero_top_k() {
        let store = MemoryStore::new(2);
        assert!(store.search(&[1.0, 0.0], 0).await.is_err());
    }

    #[tokio::test]
    async fn search_returns_at_most_top_k() {
        let store = MemoryStore::new(2);
        for i in 0..10 {
            store
                .add(chunk(&format!("c{i}"), i), vec![1.0, i as f32])
                .await
                .unwrap();
        }
        let results = store.search(&[1.0, 0.0], 4).await.unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(store.count().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn persistent_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = PersistentStore::open(dir.path(), "kb", 2).unwrap();
            store.add(chunk("alpha", 0), vec![1.0, 0.0]).await.unwrap();
            store.add(chunk("beta", 1), vec![0.0, 1.0]).await.unwrap();
            assert_eq!(store.count().await.unwrap(), 2);
        }

        let reopened = PersistentStore::open(dir.path(), "kb", 2).unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);

        let results = reopened.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].chunk.text, "alpha");
    }

    #[tokio::test]
    async fn persistent_store_rejects_corrupt_collection() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("kb.jsonl"), "not json\n").unwrap();

        let result = PersistentStore::open(dir.path(), "kb", 2);
        assert!(matches!(result, Err(Error::BackendUnavailable { .. })));
    }

    #[tokio::test]
    async fn persistent_store_rejects_dimension_drift() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = PersistentStore::open(dir.path(), "kb", 2).unwrap();
            store.add(chunk("alpha", 0), vec![1.0, 0.0]).await.unwrap();
        }
        let result = PersistentStore::open(dir.path(), "kb", 3);
        assert!(matches!(result, Err(Error::BackendUnavailable { .. })));
    }

    #[test]
    fn persistent_store_reports_unusable_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, "a plain file").unwrap();

        // Using a file as the storage directory cannot work.
        let result = PersistentStore::open(&blocker, "kb", 2);
        assert!(matches!(result, Err(Error::BackendUnavailable { .. })));
    }
}
