//! Embedding gateway.
//!
//! The embedding model is an external collaborator behind the
//! [`Embedder`] trait; [`EmbeddingGateway`] adds bounded batching and
//! shape verification on top of it. A gateway call is all-or-nothing:
//! either every input text gets a vector or the call fails.

use std::sync::Arc;

use async_trait::async_trait;
use sibyl_core::{Error, Result};

/// Trait for embedding models.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generates one embedding per input text, order-preserving.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Returns the embedding dimension.
    fn dimension(&self) -> usize;

    /// Returns the model name.
    fn model_name(&self) -> &str;
}

/// Batched, shape-checked front door to an [`Embedder`].
pub struct EmbeddingGateway {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl EmbeddingGateway {
    /// Creates a gateway with the given batch size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `batch_size` is zero.
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::config("embed_batch_size must be greater than 0"));
        }
        Ok(Self {
            embedder,
            batch_size,
        })
    }

    /// Returns the embedding dimension declared by the model.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Returns the underlying model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embeds a collection of texts in `batch_size` slices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Embedding`] if the model fails or returns a
    /// wrong number or shape of vectors; no partial output is produced.
    pub async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            let vectors = self.embedder.embed(&refs).await?;

            if vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "model returned {} vectors for {} inputs",
                    vectors.len(),
                    batch.len()
                )));
            }
            for vector in &vectors {
                if vector.len() != self.embedder.dimension() {
                    return Err(Error::embedding(format!(
                        "model returned a {}-dimensional vector, expected {}",
                        vector.len(),
                        self.embedder.dimension()
                    )));
                }
            }
            all.extend(vectors);
        }

        Ok(all)
    }

    /// Embeds a single text (a one-item batch).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Embedding`] if the model fails.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_texts(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("no embedding generated"))
    }
}

/// Deterministic embedder for tests; derives vectors from a text hash.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    /// Creates a new mock embedder.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(u64::from(b)));
                (0..self.dimension)
                    .map(|i| {
                        let seed = hash.wrapping_add(i as u64);
                        ((seed % 1000) as f32 / 1000.0) - 0.5
                    })
                    .collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embedder"
    }
}

/// Embedder that always fails; exercises the failure path in tests.
pub struct FailingEmbedder {
    dimension: usize,
}

impl FailingEmbedder {
    /// Creates a new failing embedder.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Err(Error::embedding("embedding model unavailable"))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "failing-embedder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new(64);
        let first = embedder.embed(&["hello"]).await.unwrap();
        let second = embedder.embed(&["hello"]).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].len(), 64);
    }

    #[tokio::test]
    async fn gateway_batches_and_preserves_order() {
        let gateway = EmbeddingGateway::new(Arc::new(MockEmbedder::new(8)), 2).unwrap();
        let texts: Vec<String> = (0..5).map(|i| format!("text {i}")).collect();

        let batched = gateway.embed_texts(&texts).await.unwrap();
        assert_eq!(batched.len(), 5);

        // Batching must not change per-text output.
        let whole = EmbeddingGateway::new(Arc::new(MockEmbedder::new(8)), 100)
            .unwrap()
            .embed_texts(&texts)
            .await
            .unwrap();
        assert_eq!(batched, whole);
    }

    #[tokio::test]
    async fn gateway_rejects_zero_batch_size() {
        assert!(EmbeddingGateway::new(Arc::new(MockEmbedder::new(8)), 0).is_err());
    }

    #[tokio::test]
    async fn gateway_propagates_model_failure() {
        let gateway = EmbeddingGateway::new(Arc::new(FailingEmbedder::new(8)), 4).unwrap();
        let result = gateway.embed_texts(&["a".to_string()]).await;
        assert!(matches!(result, Err(Error::Embedding { .. })));
    }

    #[tokio::test]
    async fn gateway_rejects_mismatched_shape() {
        struct WrongShape;

        #[async_trait]
        impl Embedder for WrongShape {
            async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
                Ok(texts.iter().map(|_| vec![0.0; 3]).collect())
            }
            fn dimension(&self) -> usize {
                8
            }
            fn model_name(&self) -> &str {
                "wrong-shape"
            }
        }

        let gateway = EmbeddingGateway::new(Arc::new(WrongShape), 4).unwrap();
        let result = gateway.embed_one("text").await;
        assert!(matches!(result, Err(Error::Embedding { .. })));
    }
}
