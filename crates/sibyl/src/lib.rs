//! # Sibyl
//!
//! Retrieval-augmented query service: ingests text documents, builds a
//! searchable semantic index, and serves similarity-ranked,
//! generation-backed answers while tracking operational health under
//! concurrent load.
//!
//! ## Components
//!
//! - **Chunking**: separator-aware overlapping document splitting
//! - **Embedding / Generation gateways**: batched, timeout-bounded
//!   fronts for the external models
//! - **Vector storage**: in-memory and persistent backends behind one
//!   trait, with automatic fallback at build time
//! - **Query engine**: top-k retrieval, post-filters, context assembly
//! - **Metrics**: per-query outcome tracking and live health probes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunker;
pub mod embedding;
pub mod generation;
pub mod index;
pub mod loader;
pub mod metrics;
pub mod query;
pub mod service;
pub mod store;

pub use chunker::Chunker;
pub use embedding::{Embedder, EmbeddingGateway, MockEmbedder};
pub use generation::{Generator, MockGenerator};
pub use index::{Index, IndexBuilder};
pub use loader::load_documents;
pub use metrics::MetricsTracker;
pub use query::QueryEngine;
pub use service::RagService;
pub use store::{MemoryStore, PersistentStore, VectorStore};

pub use sibyl_core::{
    Chunk, Document, Error, HealthReport, HealthStatus, MetricsSnapshot, QueryResult,
    ResponseMode, Result, ScoredChunk, ServiceConfig, SystemStatus,
};
