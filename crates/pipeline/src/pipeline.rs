use std::path::{Path, PathBuf};
use std::sync::Arc;

use pdfchat_core::{Config, RetryPolicy};
use pdfchat_index::{BuildOptions, Metric, SearchHit, VectorIndex};
use pdfchat_ingest::{
    create_embedder, extract_text, split_text, ChunkConfig, Document, Embedder, EmbeddingError,
};
use pdfchat_llm::{Answer, AnswerGenerator};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::state::{IngestState, QueryState};

/// Settings the pipeline needs besides its two providers.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunk: ChunkConfig,
    pub index_dir: PathBuf,
    pub top_k: usize,
    pub batch_size: usize,
    pub retry: RetryPolicy,
    pub metric: Metric,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        Ok(Self {
            chunk: ChunkConfig::from(&config.chunking),
            index_dir: config.retrieval.index_dir.clone(),
            top_k: config.retrieval.top_k,
            batch_size: config.embedding.batch_size,
            retry: config.network.retry_policy(),
            metric: config.retrieval.metric.parse::<Metric>()?,
        })
    }
}

/// Summary of a successful ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub documents: usize,
    /// Characters of extracted text.
    pub characters: usize,
    pub chunks: usize,
    pub index_dir: PathBuf,
}

/// Answer plus the passages it was generated from.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub answer: Answer,
    pub passages: Vec<SearchHit>,
}

pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    generator: AnswerGenerator,
    options: PipelineOptions,
    ingest_state: IngestState,
    query_state: QueryState,
}

impl Pipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: AnswerGenerator,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        options.chunk.validate()?;
        Ok(Self {
            embedder,
            generator,
            options,
            ingest_state: IngestState::Idle,
            query_state: QueryState::Idle,
        })
    }

    /// Validate `config` and wire up the configured providers.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        config.validate()?;
        let embedder = create_embedder(config)?;
        let generator = AnswerGenerator::from_config(config)?;
        Self::new(embedder, generator, PipelineOptions::from_config(config)?)
    }

    pub fn index_dir(&self) -> &Path {
        &self.options.index_dir
    }

    pub fn last_ingest_state(&self) -> &IngestState {
        &self.ingest_state
    }

    pub fn last_query_state(&self) -> &QueryState {
        &self.query_state
    }

    /// Extract, chunk and embed `docs`, then replace the persisted index.
    ///
    /// The index is only written once every chunk has been embedded, so a
    /// failure at any stage leaves the previous index untouched.
    pub async fn ingest(&mut self, docs: &[Document]) -> Result<IngestReport, PipelineError> {
        let result = self.run_ingest(docs).await;
        if let Err(e) = &result {
            self.set_ingest_state(IngestState::Failed(e.to_string()));
        }
        result
    }

    async fn run_ingest(&mut self, docs: &[Document]) -> Result<IngestReport, PipelineError> {
        self.set_ingest_state(IngestState::Idle);
        if docs.is_empty() {
            return Err(PipelineError::NoDocuments);
        }

        self.set_ingest_state(IngestState::Extracting);
        let raw_text = extract_text(docs)?;
        let characters = raw_text.chars().count();

        self.set_ingest_state(IngestState::Chunking);
        let chunks = split_text(&raw_text, &self.options.chunk);
        drop(raw_text);
        if chunks.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }
        info!("Split {} chars into {} chunks", characters, chunks.len());

        self.set_ingest_state(IngestState::Embedding);
        let build = BuildOptions {
            batch_size: self.options.batch_size,
            retry: self.options.retry.clone(),
            metric: self.options.metric,
        };
        let index = VectorIndex::build(&chunks, self.embedder.clone(), &build).await?;

        self.set_ingest_state(IngestState::Persisting);
        index.persist(&self.options.index_dir)?;

        self.set_ingest_state(IngestState::Persisted);
        Ok(IngestReport {
            documents: docs.len(),
            characters,
            chunks: chunks.len(),
            index_dir: self.options.index_dir.clone(),
        })
    }

    /// Answer `question` from the persisted index.
    pub async fn ask(&mut self, question: &str) -> Result<QueryOutcome, PipelineError> {
        let result = self.run_query(question).await;
        if let Err(e) = &result {
            self.set_query_state(QueryState::Failed(e.to_string()));
        }
        result
    }

    async fn run_query(&mut self, question: &str) -> Result<QueryOutcome, PipelineError> {
        self.set_query_state(QueryState::Idle);
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        self.set_query_state(QueryState::LoadingIndex);
        let index = VectorIndex::load(&self.options.index_dir)?;
        debug!(
            "Using index built {} ({} entries, metric={})",
            index.created_at().to_rfc3339(),
            index.len(),
            index.metric()
        );
        if index.metric() != self.options.metric {
            info!(
                "Index uses the {} metric; INDEX_METRIC={} applies from the next ingestion",
                index.metric(),
                self.options.metric
            );
        }
        if index.embedding_model() != self.embedder.model_name() {
            warn!(
                "Index was built with '{}' but queries use '{}'; results may be poor",
                index.embedding_model(),
                self.embedder.model_name()
            );
        }

        self.set_query_state(QueryState::EmbeddingQuery);
        let embedder = &self.embedder;
        let query_vector = self
            .options
            .retry
            .run("query embedding", EmbeddingError::is_transient, || {
                embedder.embed_query(question)
            })
            .await?;

        self.set_query_state(QueryState::Searching);
        let passages = index.search(&query_vector, self.options.top_k)?;
        debug!("Retrieved {} passages", passages.len());

        self.set_query_state(QueryState::Generating);
        let texts: Vec<&str> = passages.iter().map(|p| p.content.as_str()).collect();
        let answer = self.generator.answer(question, &texts).await?;

        self.set_query_state(QueryState::Answered);
        Ok(QueryOutcome { answer, passages })
    }

    fn set_ingest_state(&mut self, state: IngestState) {
        debug!("ingest: {state}");
        self.ingest_state = state;
    }

    fn set_query_state(&mut self, state: QueryState) {
        debug!("query: {state}");
        self.query_state = state;
    }
}
