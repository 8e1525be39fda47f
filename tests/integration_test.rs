/// End-to-end integration tests for the ragindex pipeline.
///
/// Tests the complete flow:
///   Corpus → Loader → Fingerprint → Embedder → FileCache → Search
use ragindex::cache::IndexCache;
use ragindex::cache::file::FileCache;
use ragindex::embedder::mock::MockEmbedder;
use ragindex::error::RagError;
use ragindex::indexer::core::IndexBuilder;
use ragindex::indexer::corpus::CorpusOptions;
use ragindex::retriever::Retriever;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const MODEL: &str = "text-embedding-3-small";

fn tank_embedder() -> MockEmbedder {
    MockEmbedder::new(3)
        .with_vector("vertical steel tanks", vec![0.95, 0.05, 0.0])
        .with_vector("grain storage silos", vec![0.05, 0.1, 0.95])
        .with_vector("steel tank pricing", vec![1.0, 0.0, 0.05])
}

fn write_corpus(dir: &Path) {
    fs::write(
        dir.join("tanks.md"),
        "---\nid: tanks\ntitle: Tanks\nsource_url: https://example.com/tanks\ntags: [steel, storage]\n---\nvertical steel tanks\n",
    )
    .unwrap();
    fs::write(
        dir.join("silos.md"),
        "---\nid: silos\ntitle: Silos\ntags:\n  - grain\n---\ngrain storage silos\n",
    )
    .unwrap();
    fs::write(
        dir.join("000_system_retrieval_policy.md"),
        "Answer only from the retrieved documents.\n",
    )
    .unwrap();
}

fn retriever(corpus: &Path, cache_path: &Path, embedder: Arc<MockEmbedder>) -> Retriever {
    let builder = IndexBuilder::new(
        CorpusOptions::new(corpus),
        embedder,
        Arc::new(FileCache::new(cache_path)),
    );
    Retriever::new(builder, MODEL)
}

/// Full pipeline: corpus → build → cache → search → policy
#[tokio::test]
async fn test_full_pipeline() {
    let temp = tempdir().unwrap();
    let corpus = temp.path().join("rag_data");
    fs::create_dir_all(&corpus).unwrap();
    write_corpus(&corpus);
    let cache_path = temp.path().join(".cache").join("index.json");

    let embedder = Arc::new(tank_embedder());
    let r = retriever(&corpus, &cache_path, embedder.clone());

    // Policy file is not part of the corpus
    let docs = r.documents().unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["silos", "tanks"], "sorted by file name");
    assert_eq!(docs[0].tags, vec!["grain"]);

    let results = r.search("steel tank pricing", 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, "tanks");
    assert_eq!(results[0].document.title, "Tanks");
    assert!(results[0].score > 0.9);

    assert!(cache_path.exists(), "index should be persisted");
    assert_eq!(embedder.batch_calls(), 1);

    assert_eq!(
        r.policy().unwrap(),
        "Answer only from the retrieved documents.\n"
    );
}

/// A fresh process over an unchanged corpus reuses the persisted index.
#[tokio::test]
async fn test_persisted_index_survives_restart() {
    let temp = tempdir().unwrap();
    write_corpus(temp.path());
    let cache_path = temp.path().join("index.json");

    let first = Arc::new(tank_embedder());
    let stats = retriever(temp.path(), &cache_path, first.clone())
        .rebuild()
        .await
        .unwrap();
    assert!(!stats.cache_hit);
    assert_eq!(stats.documents, 2);

    let second = Arc::new(tank_embedder());
    let r = retriever(temp.path(), &cache_path, second.clone());
    assert!(r.rebuild().await.unwrap().cache_hit);
    let results = r.search("steel tank pricing", 5).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].document.id, "tanks");
    assert_eq!(second.batch_calls(), 0, "no corpus embedding after restart");
}

/// Editing one body invalidates the persisted index.
#[tokio::test]
async fn test_body_edit_rebuilds() {
    let temp = tempdir().unwrap();
    write_corpus(temp.path());
    let cache_path = temp.path().join("index.json");
    let embedder = Arc::new(tank_embedder());
    let r = retriever(temp.path(), &cache_path, embedder.clone());

    r.rebuild().await.unwrap();
    fs::write(temp.path().join("silos.md"), "grain storage silo").unwrap();
    let stats = r.rebuild().await.unwrap();
    assert!(!stats.cache_hit);
    assert_eq!(embedder.batch_calls(), 2);

    let entry = FileCache::new(&cache_path).read_entry().unwrap().unwrap();
    assert_eq!(entry.docs.len(), 2);
    assert_eq!(entry.embedding_model, MODEL);
}

/// A corrupt cache file is a miss, and the rebuild replaces it.
#[tokio::test]
async fn test_corrupt_cache_is_rebuilt() {
    let temp = tempdir().unwrap();
    write_corpus(temp.path());
    let cache_path = temp.path().join("index.json");
    fs::write(&cache_path, "not json at all").unwrap();

    let embedder = Arc::new(tank_embedder());
    let r = retriever(temp.path(), &cache_path, embedder.clone());
    let results = r.search("steel tank pricing", 1).await.unwrap();
    assert_eq!(results[0].document.id, "tanks");
    assert_eq!(embedder.batch_calls(), 1);

    let cache = FileCache::new(&cache_path);
    assert!(cache.read_entry().unwrap().is_some(), "cache repaired");
}

/// Malformed front matter still yields a searchable document.
#[tokio::test]
async fn test_malformed_front_matter_is_indexed() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("broken.md"), "---\nid: x\nno closing line").unwrap();
    let r = retriever(
        temp.path(),
        &temp.path().join("index.json"),
        Arc::new(MockEmbedder::new(4)),
    );

    let results = r.search("anything", 3).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, "broken");
    assert!(!results[0].document.body.is_empty());
}

/// A failed build leaves any previous cache entry in place.
#[tokio::test]
async fn test_provider_failure_keeps_previous_cache() {
    let temp = tempdir().unwrap();
    write_corpus(temp.path());
    let cache_path = temp.path().join("index.json");
    retriever(temp.path(), &cache_path, Arc::new(tank_embedder()))
        .rebuild()
        .await
        .unwrap();
    let before = fs::read_to_string(&cache_path).unwrap();

    fs::write(temp.path().join("tanks.md"), "changed body").unwrap();
    let failing = retriever(
        temp.path(),
        &cache_path,
        Arc::new(MockEmbedder::failing("provider down")),
    );
    let err = failing.search("steel", 1).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingProvider(_)));
    assert_eq!(fs::read_to_string(&cache_path).unwrap(), before);
}

#[tokio::test]
async fn test_missing_corpus_dir() {
    let temp = tempdir().unwrap();
    let r = retriever(
        &temp.path().join("nope"),
        &temp.path().join("index.json"),
        Arc::new(MockEmbedder::new(4)),
    );
    let err = r.search("steel", 1).await.unwrap_err();
    assert!(matches!(err, RagError::CorpusUnavailable { .. }));

    let cache = FileCache::new(temp.path().join("index.json"));
    assert!(cache.get("anything").unwrap().is_none());
}
