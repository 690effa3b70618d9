//! Service configuration.
//!
//! Configuration is loaded from (in order of precedence):
//! 1. Environment variables (SIBYL_*)
//! 2. A TOML config file, when one is supplied
//! 3. Default values

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How retrieved context is assembled before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Join all ranked chunks into a single context block.
    Compact,
    /// Summarize chunk groups first, then answer over the summaries.
    TreeSummarize,
    /// Use only the top-ranked chunk as context.
    SimpleSummarize,
}

impl Default for ResponseMode {
    fn default() -> Self {
        Self::Compact
    }
}

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Embedding model identifier, forwarded to the embedding gateway.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Maximum texts per embedding call.
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,

    /// Maximum chunk size, in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Separators preferred as split points, tried longest-match last wins.
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,

    /// Number of chunks to retrieve per query.
    #[serde(default = "default_similarity_top_k")]
    pub similarity_top_k: usize,

    /// Minimum similarity score; results below it are dropped.
    #[serde(default)]
    pub similarity_cutoff: Option<f32>,

    /// Chunks must contain at least one of these terms (when non-empty).
    #[serde(default)]
    pub required_keywords: Vec<String>,

    /// Chunks containing any of these terms are dropped.
    #[serde(default)]
    pub excluded_keywords: Vec<String>,

    /// Context assembly mode.
    #[serde(default)]
    pub response_mode: ResponseMode,

    /// Hint forwarded to the generation gateway; the core issues a
    /// single generation call either way.
    #[serde(default)]
    pub streaming: bool,

    /// Prefer the persistent vector-store backend.
    #[serde(default)]
    pub use_persistent_backend: bool,

    /// Root directory for persistent collections.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    /// Collection name within the persistent store.
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Directory scanned by the document loader.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,

    /// Time budget for each external embedding/generation call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embed_batch_size() -> usize {
    10
}

fn default_chunk_size() -> usize {
    1024
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_separators() -> Vec<String> {
    vec!["\n\n".to_string(), ". ".to_string(), "\n".to_string()]
}

fn default_similarity_top_k() -> usize {
    3
}

fn default_storage_path() -> String {
    "./storage".to_string()
}

fn default_collection_name() -> String {
    "production_kb".to_string()
}

fn default_documents_dir() -> String {
    "sample_documents".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            embed_batch_size: default_embed_batch_size(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            separators: default_separators(),
            similarity_top_k: default_similarity_top_k(),
            similarity_cutoff: None,
            required_keywords: Vec::new(),
            excluded_keywords: Vec::new(),
            response_mode: ResponseMode::default(),
            streaming: false,
            use_persistent_backend: false,
            storage_path: default_storage_path(),
            collection_name: default_collection_name(),
            documents_dir: default_documents_dir(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from defaults, an optional TOML file, and
    /// `SIBYL_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a source fails to parse or
    /// the merged configuration fails validation.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(ServiceConfig::default()));

        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        let config: ServiceConfig = figment
            .merge(Env::prefixed("SIBYL_"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates parameter bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than 0"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.similarity_top_k == 0 {
            return Err(Error::config("similarity_top_k must be greater than 0"));
        }
        if self.embed_batch_size == 0 {
            return Err(Error::config("embed_batch_size must be greater than 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be greater than 0"));
        }
        if self.use_persistent_backend && self.collection_name.is_empty() {
            return Err(Error::config(
                "collection_name must be set when use_persistent_backend is enabled",
            ));
        }
        Ok(())
    }

    /// Returns `true` when any post-retrieval filter is configured.
    #[must_use]
    pub fn has_post_filters(&self) -> bool {
        self.similarity_cutoff.is_some()
            || !self.required_keywords.is_empty()
            || !self.excluded_keywords.is_empty()
    }
}
