//! Full ingest → ask round trips against real PDF extraction, with
//! deterministic in-process providers standing in for the hosted APIs.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pdfchat_core::{Config, RetryPolicy};
use pdfchat_index::{IndexError, Metric, VectorIndex, INDEX_FILE_NAME};
use pdfchat_ingest::document::test_pdf;
use pdfchat_ingest::{ChunkConfig, Document, Embedder, EmbeddingError};
use pdfchat_llm::{Answer, AnswerGenerator, LlmError, LlmProvider, Message, ANSWER_NOT_IN_CONTEXT};
use pdfchat_pipeline::{IngestState, Pipeline, PipelineError, PipelineOptions, QueryState};

const DIMS: usize = 64;

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Hashed bag-of-words vectors: texts sharing words end up close together.
struct BagOfWordsEmbedder {
    calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIMS];
        for word in words(text) {
            let h = word
                .bytes()
                .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619));
            v[h as usize % DIMS] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for BagOfWordsEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

/// Always fails with a permanent API error.
struct RejectingEmbedder;

#[async_trait]
impl Embedder for RejectingEmbedder {
    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Api {
            status: 403,
            body: "API key not valid".into(),
        })
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn model_name(&self) -> &str {
        "rejecting"
    }
}

/// Quotes the first passage when it shares a meaningful word with the
/// question, otherwise declines with the sentinel.
struct ExtractiveLlm {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for ExtractiveLlm {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = &messages[1].content;
        let (context, question) = prompt
            .split_once("Question:")
            .ok_or_else(|| LlmError::ParseError("prompt has no question".into()))?;
        let context_words: Vec<String> = words(context).collect();
        let grounded = words(question)
            .filter(|w| w.len() >= 5)
            .any(|w| context_words.contains(&w));
        if !grounded {
            return Ok(ANSWER_NOT_IN_CONTEXT.to_string());
        }
        let first = context
            .split("[1]")
            .nth(1)
            .and_then(|rest| rest.split("\n\n").next())
            .unwrap_or_default();
        Ok(first.trim().to_string())
    }

    fn model_name(&self) -> &str {
        "extractive"
    }
}

fn options(index_dir: &Path) -> PipelineOptions {
    PipelineOptions {
        chunk: ChunkConfig::default(),
        index_dir: index_dir.to_path_buf(),
        top_k: 4,
        batch_size: 8,
        retry: RetryPolicy::none(),
        metric: Metric::Euclidean,
    }
}

fn pipeline_with(embedder: Arc<dyn Embedder>, index_dir: &Path) -> (Pipeline, Arc<ExtractiveLlm>) {
    pipeline_with_options(embedder, options(index_dir))
}

fn pipeline_with_options(
    embedder: Arc<dyn Embedder>,
    options: PipelineOptions,
) -> (Pipeline, Arc<ExtractiveLlm>) {
    let llm = Arc::new(ExtractiveLlm {
        calls: AtomicUsize::new(0),
    });
    let generator = AnswerGenerator::new(llm.clone(), 0.3, 512, RetryPolicy::none());
    let pipeline = Pipeline::new(embedder, generator, options).unwrap();
    (pipeline, llm)
}

fn pdf(name: &str, pages: &[&str]) -> Document {
    Document::new(name, test_pdf::build(pages))
}

#[tokio::test]
async fn paris_question_is_answered_from_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let index_dir = dir.path().join("vector_index");
    let (mut pipeline, _llm) = pipeline_with(BagOfWordsEmbedder::new(), &index_dir);

    let report = pipeline
        .ingest(&[pdf("france.pdf", &["The capital of France is Paris."])])
        .await
        .unwrap();
    assert_eq!(report.documents, 1);
    assert_eq!(report.chunks, 1);
    assert_eq!(report.index_dir, index_dir);
    assert!(index_dir.join(INDEX_FILE_NAME).is_file());
    assert_eq!(pipeline.last_ingest_state(), &IngestState::Persisted);

    let outcome = pipeline.ask("What is the capital of France?").await.unwrap();
    match &outcome.answer {
        Answer::Generated(text) => assert!(text.contains("Paris"), "answer was {text:?}"),
        other => panic!("expected a generated answer, got {other:?}"),
    }
    assert!(!outcome.passages.is_empty());
    assert!(outcome.passages.len() <= 4);
    assert!(outcome.passages[0].content.contains("Paris"));
    assert_eq!(pipeline.last_query_state(), &QueryState::Answered);
}

#[tokio::test]
async fn cosine_index_records_metric_and_answers() {
    let dir = tempfile::tempdir().unwrap();
    let opts = PipelineOptions {
        metric: Metric::Cosine,
        ..options(dir.path())
    };
    let (mut pipeline, _llm) = pipeline_with_options(BagOfWordsEmbedder::new(), opts);
    pipeline
        .ingest(&[pdf("france.pdf", &["The capital of France is Paris."])])
        .await
        .unwrap();

    assert_eq!(VectorIndex::load(dir.path()).unwrap().metric(), Metric::Cosine);
    let outcome = pipeline.ask("What is the capital of France?").await.unwrap();
    assert!(matches!(&outcome.answer, Answer::Generated(text) if text.contains("Paris")));
}

fn metric_env(metric: &'static str) -> impl Fn(&str) -> Option<String> {
    move |key| (key == "INDEX_METRIC").then(|| metric.to_string())
}

#[test]
fn options_take_metric_from_config() {
    let config = Config::from_lookup("", &metric_env("cosine"));
    assert_eq!(PipelineOptions::from_config(&config).unwrap().metric, Metric::Cosine);

    let config = Config::from_lookup("", &|_: &str| None::<String>);
    assert_eq!(PipelineOptions::from_config(&config).unwrap().metric, Metric::Euclidean);

    let config = Config::from_lookup("", &metric_env("hamming"));
    let err = PipelineOptions::from_config(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Index(IndexError::UnknownMetric(_))));
}

#[tokio::test]
async fn unrelated_question_is_declined() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _llm) = pipeline_with(BagOfWordsEmbedder::new(), dir.path());
    pipeline
        .ingest(&[pdf("france.pdf", &["The capital of France is Paris."])])
        .await
        .unwrap();

    let outcome = pipeline.ask("Who painted the Sistine ceiling?").await.unwrap();
    assert_eq!(outcome.answer, Answer::Insufficient);
}

#[tokio::test]
async fn query_before_ingest_reports_missing_index() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, llm) = pipeline_with(BagOfWordsEmbedder::new(), &dir.path().join("none"));

    let err = pipeline.ask("What is the capital of France?").await.unwrap_err();
    assert!(matches!(err, PipelineError::NoIndex(_)));
    assert!(err.to_string().contains("ingest documents first"));
    assert!(matches!(pipeline.last_query_state(), QueryState::Failed(_)));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn document_without_text_is_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = BagOfWordsEmbedder::new();
    let (mut pipeline, _llm) = pipeline_with(embedder.clone(), dir.path());

    let err = pipeline.ingest(&[pdf("scan.pdf", &[""])]).await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyCorpus));
    assert!(matches!(pipeline.last_ingest_state(), IngestState::Failed(_)));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join(INDEX_FILE_NAME).exists());

    let err = pipeline.ask("anything at all?").await.unwrap_err();
    assert!(matches!(err, PipelineError::NoIndex(_)));
}

#[tokio::test]
async fn embedding_failure_writes_no_index() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _llm) = pipeline_with(Arc::new(RejectingEmbedder), dir.path());

    let err = pipeline
        .ingest(&[pdf("france.pdf", &["The capital of France is Paris."])])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Embedding(EmbeddingError::Api { status: 403, .. })));
    assert!(!dir.path().join(INDEX_FILE_NAME).exists());
    match pipeline.last_ingest_state() {
        IngestState::Failed(reason) => assert!(reason.contains("403")),
        other => panic!("unexpected state {other:?}"),
    }
}

#[tokio::test]
async fn failed_ingest_keeps_previous_index() {
    let dir = tempfile::tempdir().unwrap();
    let (mut good, _llm) = pipeline_with(BagOfWordsEmbedder::new(), dir.path());
    good.ingest(&[pdf("france.pdf", &["The capital of France is Paris."])])
        .await
        .unwrap();
    let before = std::fs::read(dir.path().join(INDEX_FILE_NAME)).unwrap();

    let (mut bad, _llm) = pipeline_with(Arc::new(RejectingEmbedder), dir.path());
    assert!(bad
        .ingest(&[pdf("other.pdf", &["Something else entirely."])])
        .await
        .is_err());

    let after = std::fs::read(dir.path().join(INDEX_FILE_NAME)).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn reingest_replaces_the_index() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _llm) = pipeline_with(BagOfWordsEmbedder::new(), dir.path());

    pipeline
        .ingest(&[pdf("france.pdf", &["The capital of France is Paris."])])
        .await
        .unwrap();
    pipeline
        .ingest(&[pdf("italy.pdf", &["The capital of Italy is Rome."])])
        .await
        .unwrap();

    let outcome = pipeline.ask("What is the capital of Italy?").await.unwrap();
    assert!(outcome.passages.iter().all(|p| !p.content.contains("Paris")));
    assert!(outcome.passages.iter().any(|p| p.content.contains("Rome")));
}

#[tokio::test]
async fn multiple_documents_are_all_searchable() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _llm) = pipeline_with(BagOfWordsEmbedder::new(), dir.path());

    let report = pipeline
        .ingest(&[
            pdf("france.pdf", &["The capital of France is Paris."]),
            pdf("fruit.pdf", &["Bananas grow in tropical climates.", "Apples grow in orchards."]),
        ])
        .await
        .unwrap();
    assert_eq!(report.documents, 2);

    let outcome = pipeline.ask("Where do bananas grow?").await.unwrap();
    assert!(outcome.passages.iter().any(|p| p.content.contains("Bananas")));
}

#[tokio::test]
async fn corrupt_pdf_fails_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _llm) = pipeline_with(BagOfWordsEmbedder::new(), dir.path());

    let err = pipeline
        .ingest(&[
            pdf("good.pdf", &["Readable text."]),
            Document::new("broken.pdf", b"%PDF-1.4 truncated".to_vec()),
        ])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Extraction(_)));
    assert!(err.to_string().contains("broken.pdf"));
    assert!(!dir.path().join(INDEX_FILE_NAME).exists());
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _llm) = pipeline_with(BagOfWordsEmbedder::new(), dir.path());
    let err = pipeline.ingest(&[]).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoDocuments));
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, llm) = pipeline_with(BagOfWordsEmbedder::new(), dir.path());
    let err = pipeline.ask("   \n").await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyQuestion));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn invalid_chunk_settings_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(dir.path());
    opts.chunk.chunk_overlap = opts.chunk.chunk_size;
    let llm = Arc::new(ExtractiveLlm {
        calls: AtomicUsize::new(0),
    });
    let generator = AnswerGenerator::new(llm, 0.3, 512, RetryPolicy::none());
    let result = Pipeline::new(BagOfWordsEmbedder::new(), generator, opts);
    assert!(matches!(result, Err(PipelineError::Chunking(_))));
}
