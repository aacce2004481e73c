use super::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Maps each text to a 3-d vector derived from its first byte and length,
/// so distinct texts land in distinct places deterministically.
struct FakeEmbedder {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }
}

fn fake_vector(text: &str) -> Vec<f32> {
    let first = text.bytes().next().unwrap_or(0) as f32;
    vec![first, text.len() as f32, 1.0]
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::Api {
                status: 401,
                body: "bad key".into(),
            });
        }
        Ok(texts.iter().map(|t| fake_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "fake-embedder"
    }
}

fn chunks(texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(index, t)| Chunk {
            index,
            content: t.to_string(),
        })
        .collect()
}

fn options(batch_size: usize) -> BuildOptions {
    BuildOptions {
        batch_size,
        retry: RetryPolicy::none(),
        metric: Metric::Euclidean,
    }
}

fn sample_index(metric: Metric) -> VectorIndex {
    VectorIndex::from_entries(
        vec![
            ("origin".to_string(), vec![0.0, 0.0]),
            ("east".to_string(), vec![1.0, 0.0]),
            ("north".to_string(), vec![0.0, 1.0]),
            ("far east".to_string(), vec![5.0, 0.0]),
            ("east again".to_string(), vec![1.0, 0.0]),
        ],
        metric,
        "fake-embedder",
    )
    .unwrap()
}

// ── Build ───────────────────────────────────────────────────────────

#[tokio::test]
async fn build_rejects_empty_corpus_without_calling_provider() {
    let embedder = Arc::new(FakeEmbedder::new());
    let err = VectorIndex::build(&[], embedder.clone(), &options(8))
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::EmptyCorpus));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn build_keeps_chunker_order_across_batches() {
    let texts = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf"];
    let embedder = Arc::new(FakeEmbedder::new());
    let index = VectorIndex::build(&chunks(&texts), embedder.clone(), &options(3))
        .await
        .unwrap();

    assert_eq!(index.len(), texts.len());
    assert_eq!(index.contents().collect::<Vec<_>>(), texts.to_vec());
    assert_eq!(index.dimension(), 3);
    assert_eq!(index.embedding_model(), "fake-embedder");
    // 7 chunks in batches of 3.
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn build_surfaces_provider_failure() {
    let embedder = Arc::new(FakeEmbedder::failing());
    let err = VectorIndex::build(&chunks(&["a", "b"]), embedder, &options(8))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IndexError::Embedding(EmbeddingError::Api { status: 401, .. })
    ));
}

#[tokio::test]
async fn built_index_finds_exact_chunk() {
    let texts = ["apples are red", "bananas are yellow", "cherries are dark"];
    let embedder = Arc::new(FakeEmbedder::new());
    let index = VectorIndex::build(&chunks(&texts), embedder, &options(8))
        .await
        .unwrap();

    let hits = index.search(&fake_vector("bananas are yellow"), 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "bananas are yellow");
    assert_eq!(hits[0].score, 0.0);
}

#[test]
fn from_entries_rejects_ragged_vectors() {
    let err = VectorIndex::from_entries(
        vec![("a".into(), vec![1.0, 2.0]), ("b".into(), vec![1.0])],
        Metric::Euclidean,
        "m",
    )
    .unwrap_err();
    assert!(matches!(err, IndexError::DimensionMismatch { expected: 2, actual: 1 }));
}

// ── Search ──────────────────────────────────────────────────────────

#[test]
fn search_returns_at_most_min_k_n() {
    let index = sample_index(Metric::Euclidean);
    assert_eq!(index.search(&[0.0, 0.0], 2).unwrap().len(), 2);
    assert_eq!(index.search(&[0.0, 0.0], 50).unwrap().len(), 5);
    assert!(index.search(&[0.0, 0.0], 0).unwrap().is_empty());
}

#[test]
fn euclidean_results_are_non_increasing_in_similarity() {
    let index = sample_index(Metric::Euclidean);
    let hits = index.search(&[0.9, 0.1], 5).unwrap();
    for pair in hits.windows(2) {
        assert!(pair[0].score <= pair[1].score, "{hits:?}");
    }
    for (i, hit) in hits.iter().enumerate() {
        assert_eq!(hit.rank, i);
    }
}

#[test]
fn cosine_results_are_non_increasing_in_similarity() {
    let index = sample_index(Metric::Cosine);
    let hits = index.search(&[1.0, 0.2], 5).unwrap();
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score, "{hits:?}");
    }
}

#[test]
fn ties_keep_insertion_order() {
    let index = sample_index(Metric::Euclidean);
    let hits = index.search(&[1.0, 0.0], 2).unwrap();
    assert_eq!(hits[0].content, "east");
    assert_eq!(hits[0].position, 1);
    assert_eq!(hits[1].content, "east again");
    assert_eq!(hits[1].position, 4);
}

#[test]
fn empty_index_search_is_empty_not_error() {
    let index = VectorIndex::from_entries(Vec::new(), Metric::Euclidean, "m").unwrap();
    assert!(index.is_empty());
    // Even a wrongly-sized query is fine against nothing.
    assert!(index.search(&[1.0, 2.0, 3.0], 4).unwrap().is_empty());
}

#[test]
fn query_dimension_mismatch_is_an_error() {
    let index = sample_index(Metric::Euclidean);
    let err = index.search(&[1.0, 2.0, 3.0], 1).unwrap_err();
    assert!(matches!(err, IndexError::DimensionMismatch { expected: 2, actual: 3 }));
}

// ── Persistence ─────────────────────────────────────────────────────

#[test]
fn load_without_persist_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = VectorIndex::load(&dir.path().join("nothing-here")).unwrap_err();
    assert!(matches!(err, IndexError::NotFound(_)));

    // Existing but empty directory is also "not found".
    let err = VectorIndex::load(dir.path()).unwrap_err();
    assert!(matches!(err, IndexError::NotFound(_)));
}

#[test]
fn persist_then_load_gives_identical_search_results() {
    let dir = tempfile::tempdir().unwrap();
    let index = sample_index(Metric::Cosine);
    let path = index.persist(dir.path()).unwrap();
    assert!(path.ends_with(INDEX_FILE_NAME));
    assert!(!dir.path().join(format!("{INDEX_FILE_NAME}.tmp")).exists());

    let loaded = VectorIndex::load(dir.path()).unwrap();
    assert_eq!(loaded, index);
    assert_eq!(loaded.metric(), Metric::Cosine);
    assert_eq!(loaded.created_at(), index.created_at());
    for query in [[0.3, 0.7], [1.0, 0.0], [-1.0, 0.5]] {
        assert_eq!(
            loaded.search(&query, 3).unwrap(),
            index.search(&query, 3).unwrap()
        );
    }
}

#[test]
fn persist_overwrites_previous_index() {
    let dir = tempfile::tempdir().unwrap();
    sample_index(Metric::Euclidean).persist(dir.path()).unwrap();

    let replacement = VectorIndex::from_entries(
        vec![("only".to_string(), vec![9.0, 9.0, 9.0])],
        Metric::Euclidean,
        "other-model",
    )
    .unwrap();
    replacement.persist(dir.path()).unwrap();

    let loaded = VectorIndex::load(dir.path()).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.dimension(), 3);
    assert_eq!(loaded.embedding_model(), "other-model");
}

#[test]
fn failed_persist_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    // A non-empty directory where the index file belongs makes the rename fail.
    let blocker = dir.path().join(INDEX_FILE_NAME);
    std::fs::create_dir(&blocker).unwrap();
    std::fs::write(blocker.join("keep"), b"x").unwrap();

    let err = sample_index(Metric::Euclidean).persist(dir.path()).unwrap_err();
    assert!(matches!(err, IndexError::Io(_)));
    assert!(!dir.path().join(format!("{INDEX_FILE_NAME}.tmp")).exists());
    assert!(blocker.join("keep").is_file());
}

#[test]
fn persist_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    sample_index(Metric::Euclidean).persist(&nested).unwrap();
    assert!(nested.join(INDEX_FILE_NAME).is_file());
}

#[test]
fn garbage_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(INDEX_FILE_NAME), b"\xc1\xc1 definitely not msgpack").unwrap();
    let err = VectorIndex::load(dir.path()).unwrap_err();
    assert!(matches!(err, IndexError::Corrupt { .. }));
}

#[test]
fn truncated_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = sample_index(Metric::Euclidean).persist(dir.path()).unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    let err = VectorIndex::load(dir.path()).unwrap_err();
    assert!(matches!(err, IndexError::Corrupt { .. }));
}

#[test]
fn inconsistent_dimensions_are_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let mut index = sample_index(Metric::Euclidean);
    index.entries[2].vector.push(42.0);
    index.persist(dir.path()).unwrap();
    let err = VectorIndex::load(dir.path()).unwrap_err();
    assert!(matches!(err, IndexError::Corrupt { .. }));
}

#[test]
fn unknown_format_version_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let mut index = sample_index(Metric::Euclidean);
    index.format_version = 99;
    index.persist(dir.path()).unwrap();
    let err = VectorIndex::load(dir.path()).unwrap_err();
    assert!(matches!(err, IndexError::Corrupt { .. }));
}
