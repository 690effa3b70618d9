//! # Sibyl Core
//!
//! Core types and configuration for the Sibyl retrieval service.
//!
//! This crate provides the foundational pieces shared across the service:
//! - Common error types
//! - Document, chunk, and query-result structures
//! - Metrics and health report types
//! - The service configuration surface

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{ResponseMode, ServiceConfig};
pub use error::{Error, Result};
pub use types::{
    Chunk, Document, HealthReport, HealthStatus, MetricsSnapshot, QueryResult, ScoredChunk,
    SystemStatus,
};
