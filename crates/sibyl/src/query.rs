//! Query engine.
//!
//! Pipeline per query: embed the question, over-fetch candidates when
//! post-filters are configured, apply the similarity cutoff and the
//! keyword filters, truncate to the requested top-k, assemble a
//! context block per the response mode, and invoke the generator.
//! Failures at any stage are converted into a failed [`QueryResult`]
//! at this boundary; a bad query never raises a fault to the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sibyl_core::{Error, QueryResult, ResponseMode, Result, ScoredChunk, ServiceConfig};
use sibyl_telemetry::Timer;

use crate::embedding::{Embedder, EmbeddingGateway};
use crate::generation::Generator;
use crate::index::Index;

/// Candidate multiplier applied when post-filters may drop results.
const OVERFETCH_FACTOR: usize = 4;

/// Chunks summarized per intermediate call in tree-summarize mode.
const SUMMARY_GROUP_SIZE: usize = 3;

/// Retrieval-augmented query engine over a built [`Index`].
pub struct QueryEngine {
    index: Arc<Index>,
    gateway: EmbeddingGateway,
    generator: Arc<dyn Generator>,
    config: ServiceConfig,
    timeout: Duration,
}

impl QueryEngine {
    /// Creates an engine serving queries against `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for invalid batching
    /// parameters.
    pub fn new(
        config: ServiceConfig,
        index: Arc<Index>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let gateway = EmbeddingGateway::new(embedder, config.embed_batch_size)?;
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Ok(Self {
            index,
            gateway,
            generator,
            config,
            timeout,
        })
    }

    /// Serves one query, returning an attributed result.
    ///
    /// Never fails: embedding, generation, and timeout errors become
    /// `QueryResult { success: false, .. }`.
    pub async fn query(&self, question: &str) -> QueryResult {
        let timer = Timer::start("query");

        match self.answer(question).await {
            Ok((answer, sources)) => {
                let elapsed = timer.elapsed();
                tracing::info!(
                    sources = sources.len(),
                    latency_ms = timer.elapsed_ms(),
                    "Query succeeded"
                );
                QueryResult::success(answer, sources, elapsed)
            }
            Err(e) => {
                let elapsed = timer.elapsed();
                tracing::warn!(error = %e, latency_ms = timer.elapsed_ms(), "Query failed");
                QueryResult::failure(e.to_string(), elapsed)
            }
        }
    }

    async fn answer(&self, question: &str) -> Result<(String, Vec<ScoredChunk>)> {
        let vector = self.bounded(self.gateway.embed_one(question)).await?;

        let top_k = self.config.similarity_top_k;
        let fetch_k = if self.config.has_post_filters() {
            top_k * OVERFETCH_FACTOR
        } else {
            top_k
        };

        let mut results = self.index.search(&vector, fetch_k).await?;
        self.apply_filters(&mut results);
        results.truncate(top_k);

        let context = self.assemble_context(question, &results).await?;
        let answer = self
            .bounded(self.generator.generate(question, &context))
            .await?;

        Ok((answer, results))
    }

    /// Similarity cutoff first, then the keyword filters, matching the
    /// order the retrieval post-processors are chained in.
    fn apply_filters(&self, results: &mut Vec<ScoredChunk>) {
        if let Some(cutoff) = self.config.similarity_cutoff {
            results.retain(|r| r.score >= cutoff);
        }
        if !self.config.required_keywords.is_empty() {
            results.retain(|r| {
                self.config
                    .required_keywords
                    .iter()
                    .any(|kw| r.chunk.text.contains(kw.as_str()))
            });
        }
        if !self.config.excluded_keywords.is_empty() {
            results.retain(|r| {
                !self
                    .config
                    .excluded_keywords
                    .iter()
                    .any(|kw| r.chunk.text.contains(kw.as_str()))
            });
        }
    }

    /// Assembles the context block fed to the generator.
    ///
    /// Zero retrieved chunks yield an empty block; the generation call
    /// still happens and produces an ungrounded answer.
    async fn assemble_context(&self, question: &str, results: &[ScoredChunk]) -> Result<String> {
        match self.config.response_mode {
            ResponseMode::Compact => Ok(join_numbered(results)),
            ResponseMode::SimpleSummarize => Ok(results
                .first()
                .map(|r| r.chunk.text.clone())
                .unwrap_or_default()),
            ResponseMode::TreeSummarize => {
                if results.len() <= SUMMARY_GROUP_SIZE {
                    return Ok(join_numbered(results));
                }
                let mut summaries = Vec::new();
                for group in results.chunks(SUMMARY_GROUP_SIZE) {
                    let group_context = join_numbered(group);
                    let summary = self
                        .bounded(self.generator.generate(question, &group_context))
                        .await?;
                    summaries.push(summary);
                }
                Ok(summaries.join("\n\n"))
            }
        }
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| Error::Timeout {
                duration: self.timeout,
            })?
    }
}

fn join_numbered(results: &[ScoredChunk]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[{}] {}", i + 1, r.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}
