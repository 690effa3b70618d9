//! End-to-end scenarios for the service facade.

use std::sync::Arc;

use async_trait::async_trait;
use sibyl::embedding::MockEmbedder;
use sibyl::generation::{Generator, MockGenerator};
use sibyl::{Document, Error, RagService, Result, ServiceConfig};

/// Fails generation whenever the question asks it to.
struct FlakyGenerator;

#[async_trait]
impl Generator for FlakyGenerator {
    async fn generate(&self, question: &str, _context: &str) -> Result<String> {
        if question.contains("fail") {
            Err(Error::generation("engineered failure"))
        } else {
            Ok("fine".to_string())
        }
    }

    fn model_name(&self) -> &str {
        "flaky"
    }
}

fn config() -> ServiceConfig {
    ServiceConfig {
        chunk_size: 120,
        chunk_overlap: 20,
        ..ServiceConfig::default()
    }
}

fn documents() -> Vec<Document> {
    vec![
        Document::new(
            "Artificial intelligence is the study of making machines act \
             intelligently. Machine learning is a subfield of it.",
            "docs/ai.txt",
        ),
        Document::new(
            "Cloud computing offers elasticity, cost efficiency, and \
             managed infrastructure for modern workloads.",
            "docs/cloud.txt",
        ),
    ]
}

#[tokio::test]
async fn ten_concurrent_queries_with_two_failures() {
    let service = Arc::new(
        RagService::build(
            config(),
            Arc::new(MockEmbedder::new(32)),
            Arc::new(FlakyGenerator),
            &documents(),
        )
        .await
        .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..10 {
        let service = service.clone();
        let question = if i < 2 {
            format!("please fail number {i}")
        } else {
            format!("what is ai, attempt {i}")
        };
        handles.push(tokio::spawn(
            async move { service.query(&question).await },
        ));
    }

    let results = futures::future::join_all(handles).await;
    let successes = results
        .iter()
        .filter(|r| r.as_ref().unwrap().success)
        .count();
    assert_eq!(successes, 8);

    let snapshot = service.metrics();
    assert_eq!(snapshot.total_queries, 10);
    assert_eq!(snapshot.successful_queries, 8);
    assert_eq!(snapshot.failed_queries, 2);
    assert!((snapshot.success_rate - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn unreachable_persistent_store_degrades_to_memory_service() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, "occupied").unwrap();

    let cfg = ServiceConfig {
        use_persistent_backend: true,
        storage_path: blocker.to_string_lossy().into_owned(),
        ..config()
    };

    let service = RagService::build(
        cfg,
        Arc::new(MockEmbedder::new(32)),
        Arc::new(MockGenerator::new("still serving")),
        &documents(),
    )
    .await
    .unwrap();

    assert!(service.index().used_fallback());
    assert!(service.index().count().await.unwrap() > 0);

    let result = service.query("what is cloud computing?").await;
    assert!(result.success);
    assert_eq!(result.answer, "still serving");
}

#[tokio::test]
async fn persistent_index_survives_service_restart() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServiceConfig {
        use_persistent_backend: true,
        storage_path: dir.path().to_string_lossy().into_owned(),
        collection_name: "kb".to_string(),
        ..config()
    };

    let chunk_count = {
        let service = RagService::build(
            cfg.clone(),
            Arc::new(MockEmbedder::new(32)),
            Arc::new(MockGenerator::default()),
            &documents(),
        )
        .await
        .unwrap();
        service.index().count().await.unwrap()
    };
    assert!(chunk_count > 0);

    // A fresh service over the same collection sees the old records
    // plus its own build.
    let service = RagService::build(
        cfg,
        Arc::new(MockEmbedder::new(32)),
        Arc::new(MockGenerator::default()),
        &[],
    )
    .await
    .unwrap();
    assert_eq!(service.index().count().await.unwrap(), chunk_count);
    assert!(!service.index().used_fallback());
}

#[tokio::test]
async fn empty_index_serves_ungrounded_answers() {
    let service = RagService::build(
        config(),
        Arc::new(MockEmbedder::new(32)),
        Arc::new(MockGenerator::new("no grounding available")),
        &[],
    )
    .await
    .unwrap();

    assert_eq!(service.index().count().await.unwrap(), 0);

    let result = service.query("anything at all").await;
    assert!(result.success);
    assert!(result.sources.is_empty());
    assert_eq!(result.answer, "no grounding available");

    let snapshot = service.metrics();
    assert_eq!(snapshot.total_queries, 1);
    assert_eq!(snapshot.successful_queries, 1);
}
