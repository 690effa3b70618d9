//! Generation gateway.
//!
//! The completion model is an external collaborator behind the
//! [`Generator`] trait: given a question and an assembled context
//! block, it produces an answer. The core issues one call per request
//! and never retries on its own.

use async_trait::async_trait;
use sibyl_core::{Error, Result};

/// Trait for generation models.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produces an answer to `question` grounded in `context`.
    ///
    /// An empty `context` is a valid input; the model answers without
    /// grounding.
    async fn generate(&self, question: &str, context: &str) -> Result<String>;

    /// Returns the model name.
    fn model_name(&self) -> &str;
}

/// Canned-answer generator for tests.
pub struct MockGenerator {
    answer: String,
}

impl MockGenerator {
    /// Creates a generator that echoes a fixed answer.
    #[must_use]
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("mock answer")
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, _question: &str, _context: &str) -> Result<String> {
        Ok(self.answer.clone())
    }

    fn model_name(&self) -> &str {
        "mock-generator"
    }
}

/// Generator that always fails; exercises the failure path in tests.
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _question: &str, _context: &str) -> Result<String> {
        Err(Error::generation("generation model unavailable"))
    }

    fn model_name(&self) -> &str {
        "failing-generator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_generator_returns_canned_answer() {
        let generator = MockGenerator::new("the answer");
        let answer = generator.generate("question?", "context").await.unwrap();
        assert_eq!(answer, "the answer");
    }

    #[tokio::test]
    async fn failing_generator_reports_generation_error() {
        let result = FailingGenerator.generate("question?", "").await;
        assert!(matches!(result, Err(Error::Generation { .. })));
    }
}
