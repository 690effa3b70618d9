//! Common types used across the Sibyl retrieval service.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata key carrying a document's source identity.
pub const SOURCE_KEY: &str = "source";

/// A raw text document, immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Full document text.
    pub text: String,
    /// Metadata inherited by every chunk (source path, title, ...).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Creates a document with the given source identity.
    #[must_use]
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the document's source identity, if present.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A bounded segment of a document's text, the atomic retrieval unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// Start offset (in chars) within the source document.
    pub start: usize,
    /// End offset (in chars) within the source document.
    pub end: usize,
    /// Position of this chunk within its document.
    pub index: usize,
    /// Source document identity, used for attribution only.
    pub source: Option<String>,
    /// Metadata inherited from the source document.
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Creates a new chunk with a fresh id.
    #[must_use]
    pub fn new(text: impl Into<String>, start: usize, end: usize, index: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            start,
            end,
            index,
            source: None,
            metadata: HashMap::new(),
        }
    }

    /// Attaches the source document's identity and metadata.
    #[must_use]
    pub fn with_document(mut self, document: &Document) -> Self {
        self.source = document.source().map(str::to_string);
        self.metadata = document.metadata.clone();
        self
    }
}

/// A chunk ranked against a query, with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Similarity score (higher = more similar).
    pub score: f32,
}

/// Outcome of one query against the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Generated answer text (empty on failure).
    pub answer: String,
    /// Contributing chunks in ranked order.
    pub sources: Vec<ScoredChunk>,
    /// Whether the query completed successfully.
    pub success: bool,
    /// Error description when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent serving the query.
    pub response_time: Duration,
    /// When the query completed.
    pub timestamp: DateTime<Utc>,
}

impl QueryResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(answer: String, sources: Vec<ScoredChunk>, response_time: Duration) -> Self {
        Self {
            answer,
            sources,
            success: true,
            error: None,
            response_time,
            timestamp: Utc::now(),
        }
    }

    /// Creates a failed result carrying the error description.
    #[must_use]
    pub fn failure(error: impl Into<String>, response_time: Duration) -> Self {
        Self {
            answer: String::new(),
            sources: Vec::new(),
            success: false,
            error: Some(error.into()),
            response_time,
            timestamp: Utc::now(),
        }
    }
}

/// Aggregate service status derived from the historical success rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    /// Success rate above the health threshold.
    Healthy,
    /// Success rate at or below the health threshold.
    Degraded,
}

/// Point-in-time view of the metrics counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total queries served.
    pub total_queries: u64,
    /// Queries that completed successfully.
    pub successful_queries: u64,
    /// Queries that failed.
    pub failed_queries: u64,
    /// Running average latency of successful queries, in seconds.
    pub average_response_time: f64,
    /// `successful / total`, 0 when no queries have been served.
    pub success_rate: f64,
    /// Aggregate status at the fixed 0.9 threshold.
    pub system_status: SystemStatus,
}

/// Outcome of a live health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// The probe query succeeded.
    Healthy,
    /// The probe query failed.
    Unhealthy,
}

/// Report produced by `health_check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Probe outcome.
    pub status: HealthStatus,
    /// Probe latency.
    pub response_time: Duration,
    /// When the probe ran.
    pub timestamp: DateTime<Utc>,
}
