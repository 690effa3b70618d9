//! Service facade.
//!
//! [`RagService`] owns the built index and the metrics tracker for its
//! lifetime and exposes the three-call surface: `query`, `metrics`,
//! `health_check`. Index construction happens once, before the facade
//! exists; every method takes `&self` and is safe for concurrent
//! callers.

use std::sync::Arc;

use chrono::Utc;
use sibyl_core::{
    Document, HealthReport, HealthStatus, MetricsSnapshot, QueryResult, Result, ServiceConfig,
};

use crate::embedding::Embedder;
use crate::generation::Generator;
use crate::index::{Index, IndexBuilder};
use crate::loader::load_documents;
use crate::metrics::MetricsTracker;
use crate::query::QueryEngine;

/// Question issued by the live health probe.
const HEALTH_PROBE_QUESTION: &str = "health check probe";

/// Retrieval-augmented query service.
pub struct RagService {
    engine: QueryEngine,
    index: Arc<Index>,
    metrics: MetricsTracker,
}

impl RagService {
    /// Builds the index from `documents` and starts the service.
    ///
    /// # Errors
    ///
    /// Returns configuration errors and build-time embedding errors.
    /// Persistent-backend unavailability is recovered by fallback and
    /// is not an error.
    pub async fn build(
        config: ServiceConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        documents: &[Document],
    ) -> Result<Self> {
        config.validate()?;

        let builder = IndexBuilder::new(config.clone(), embedder.clone())?;
        let index = Arc::new(builder.build(documents).await?);
        let engine = QueryEngine::new(config, index.clone(), embedder, generator)?;

        tracing::info!(
            backend = %index.backend_name(),
            chunks = index.count().await?,
            "Service ready"
        );

        Ok(Self {
            engine,
            index,
            metrics: MetricsTracker::new(),
        })
    }

    /// Builds the service from the configured documents directory.
    ///
    /// # Errors
    ///
    /// Propagates loader I/O errors in addition to [`Self::build`]'s.
    pub async fn from_documents_dir(
        config: ServiceConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let documents = load_documents(&config.documents_dir)?;
        Self::build(config, embedder, generator, &documents).await
    }

    /// Serves one query and records its outcome in the metrics.
    pub async fn query(&self, question: &str) -> QueryResult {
        let result = self.engine.query(question).await;
        if result.success {
            self.metrics.record_success(result.response_time);
        } else {
            self.metrics.record_failure();
        }
        result
    }

    /// Returns the current metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Runs one live probe query and reports its outcome.
    ///
    /// The probe flows through the full query path (and is recorded in
    /// the metrics like any other query); the reported status depends
    /// only on this probe, not on historical counters.
    pub async fn health_check(&self) -> HealthReport {
        let result = self.query(HEALTH_PROBE_QUESTION).await;

        let status = if result.success {
            HealthStatus::Healthy
        } else {
            tracing::warn!(error = ?result.error, "Health probe failed");
            HealthStatus::Unhealthy
        };

        HealthReport {
            status,
            response_time: result.response_time,
            timestamp: Utc::now(),
        }
    }

    /// Returns the underlying index.
    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }
}
