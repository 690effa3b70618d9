//! Index construction.
//!
//! The builder orchestrates chunking, batched embedding, and backend
//! selection. Backend fallback is decided here, not inside the store
//! constructors: a persistent backend that cannot be constructed is
//! logged and replaced with an in-memory one, so a build never fails
//! solely because the durable store is unreachable.

use std::sync::Arc;

use sibyl_core::{Document, Result, ScoredChunk, ServiceConfig};

use crate::chunker::Chunker;
use crate::embedding::{Embedder, EmbeddingGateway};
use crate::store::{MemoryStore, PersistentStore, VectorStore};

/// A built, queryable index. Read-only after construction.
pub struct Index {
    store: Arc<dyn VectorStore>,
    fallback_applied: bool,
}

impl Index {
    /// Returns up to `top_k` chunks ranked against the query vector.
    ///
    /// # Errors
    ///
    /// Propagates the backend's search errors.
    pub async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        self.store.search(query, top_k).await
    }

    /// Returns the number of indexed chunks.
    ///
    /// # Errors
    ///
    /// Propagates the backend's count errors.
    pub async fn count(&self) -> Result<usize> {
        self.store.count().await
    }

    /// Returns the backend identifier serving this index.
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.store.backend_name()
    }

    /// Returns `true` if the persistent backend was requested but the
    /// index fell back to the in-memory one.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.fallback_applied
    }
}

/// Builds an [`Index`] from a document set.
pub struct IndexBuilder {
    chunker: Chunker,
    gateway: EmbeddingGateway,
    config: ServiceConfig,
}

impl IndexBuilder {
    /// Creates a builder from the service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`sibyl_core::Error::InvalidConfig`] for invalid
    /// chunking or batching parameters.
    pub fn new(config: ServiceConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let chunker = Chunker::new(
            config.chunk_size,
            config.chunk_overlap,
            config.separators.clone(),
        )?;
        let gateway = EmbeddingGateway::new(embedder, config.embed_batch_size)?;
        Ok(Self {
            chunker,
            gateway,
            config,
        })
    }

    /// Chunks and embeds `documents` into a fresh index.
    ///
    /// An empty document set yields an empty, queryable index. Any
    /// embedding failure aborts the build before a single insert, so
    /// no partial index is produced.
    ///
    /// # Errors
    ///
    /// Propagates embedding and insert errors. Persistent-backend
    /// construction failure is not an error; it triggers fallback.
    pub async fn build(&self, documents: &[Document]) -> Result<Index> {
        let chunks: Vec<_> = documents
            .iter()
            .flat_map(|doc| self.chunker.split_document(doc))
            .collect();

        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            model = %self.gateway.model_name(),
            "Building index"
        );

        let (store, fallback_applied) = self.select_backend();

        if chunks.is_empty() {
            return Ok(Index {
                store,
                fallback_applied,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.gateway.embed_texts(&texts).await?;

        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            store.add(chunk, vector).await?;
        }

        tracing::info!(
            backend = %store.backend_name(),
            count = store.count().await?,
            "Index built"
        );

        Ok(Index {
            store,
            fallback_applied,
        })
    }

    /// Picks the configured backend, falling back to memory when the
    /// persistent store cannot be constructed.
    fn select_backend(&self) -> (Arc<dyn VectorStore>, bool) {
        let dimension = self.gateway.dimension();

        if self.config.use_persistent_backend {
            match PersistentStore::open(
                &self.config.storage_path,
                &self.config.collection_name,
                dimension,
            ) {
                Ok(store) => return (Arc::new(store), false),
                Err(e) => {
                    tracing::warn!(
                        collection = %self.config.collection_name,
                        storage_path = %self.config.storage_path,
                        error = %e,
                        "Persistent backend unavailable, falling back to in-memory index"
                    );
                    return (Arc::new(MemoryStore::new(dimension)), true);
                }
            }
        }

        (Arc::new(MemoryStore::new(dimension)), false)
    }
}
