use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Load a specific env file. Unlike [`load_dotenv`], a missing file is an error.
pub fn load_env_file(path: &Path) -> Result<(), ConfigError> {
    dotenvy::from_path(path).map_err(|e| ConfigError::Invalid {
        key: "--env-file".to_string(),
        reason: format!("{}: {e}", path.display()),
    })
}

/// Profiled variable lookup: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
/// Empty values count as unset.
struct ProfiledEnv<'a> {
    profile: &'a str,
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl ProfiledEnv<'_> {
    fn opt(&self, key: &str) -> Option<String> {
        let get = |k: &str| (self.lookup)(k).filter(|s| !s.is_empty());
        if !self.profile.is_empty() {
            if let Some(v) = get(&format!("{}_{}", self.profile, key)) {
                return Some(v);
            }
        }
        get(key)
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.opt(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub credentials: CredentialsConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub ollama: OllamaConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub network: NetworkConfig,
}

const KNOWN_PROVIDERS: &[&str] = &["gemini", "openai", "ollama"];
const KNOWN_METRICS: &[&str] = &["euclidean", "cosine"];

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PDFCHAT_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env::var("PDFCHAT_PROFILE").unwrap_or_default();
        Self::from_lookup(&profile, &|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (env, map, ...).
    pub fn from_lookup(profile: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let p = profile.to_uppercase();
        let e = ProfiledEnv { profile: &p, lookup };
        Self {
            profile: p.clone(),
            credentials: CredentialsConfig::from_env(&e),
            llm: LlmConfig::from_env(&e),
            embedding: EmbeddingConfig::from_env(&e),
            ollama: OllamaConfig::from_env(&e),
            chunking: ChunkingConfig::from_env(&e),
            retrieval: RetrievalConfig::from_env(&e),
            network: NetworkConfig::from_env(&e),
        }
    }

    /// Check everything that must hold before the application may start:
    /// known providers, the credential each hosted provider needs, and sane
    /// chunking/retrieval settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, provider) in [
            ("LLM_PROVIDER", &self.llm.provider),
            ("EMBEDDING_PROVIDER", &self.embedding.provider),
        ] {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    reason: format!(
                        "unknown provider '{provider}' (expected one of: {})",
                        KNOWN_PROVIDERS.join(", ")
                    ),
                });
            }
        }

        for (role, provider) in [
            ("generation", &self.llm.provider),
            ("embeddings", &self.embedding.provider),
        ] {
            let (key, value) = match provider.as_str() {
                "gemini" => ("GOOGLE_API_KEY", &self.credentials.google_api_key),
                "openai" => ("OPENAI_API_KEY", &self.credentials.openai_api_key),
                _ => continue,
            };
            if value.is_none() {
                return Err(ConfigError::MissingCredential {
                    key: key.to_string(),
                    needed_by: format!("{provider} {role}"),
                });
            }
        }

        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "CHUNK_SIZE".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Invalid {
                key: "CHUNK_OVERLAP".to_string(),
                reason: format!(
                    "overlap {} must be smaller than chunk size {}",
                    self.chunking.chunk_overlap, self.chunking.chunk_size
                ),
            });
        }
        if self.chunking.separator.is_empty() {
            return Err(ConfigError::Invalid {
                key: "CHUNK_SEPARATOR".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid {
                key: "RETRIEVAL_TOP_K".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !KNOWN_METRICS.contains(&self.retrieval.metric.as_str()) {
            return Err(ConfigError::Invalid {
                key: "INDEX_METRIC".to_string(),
                reason: format!(
                    "unknown metric '{}' (expected one of: {})",
                    self.retrieval.metric,
                    KNOWN_METRICS.join(", ")
                ),
            });
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "EMBEDDING_BATCH_SIZE".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  llm:         provider={}, temperature={}",
            self.llm.provider,
            self.llm.temperature
        );
        tracing::info!(
            "  embedding:   provider={}, batch_size={}",
            self.embedding.provider,
            self.embedding.batch_size
        );
        tracing::info!(
            "  chunking:    size={}, overlap={}",
            self.chunking.chunk_size,
            self.chunking.chunk_overlap
        );
        tracing::info!(
            "  retrieval:   top_k={}, index_dir={}, metric={}",
            self.retrieval.top_k,
            self.retrieval.index_dir.display(),
            self.retrieval.metric
        );
        tracing::info!(
            "  network:     timeout={}s, max_retries={}",
            self.network.timeout_secs,
            self.network.max_retries
        );
        tracing::info!(
            "  credentials: google={}, openai={}",
            redact(&self.credentials.google_api_key),
            redact(&self.credentials.openai_api_key)
        );
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "set" } else { "(none)" }
}

/// Turn `\n`, `\t` and `\\` escapes into the characters they name, so a
/// separator can be written on one line in a .env file.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// ── Credentials ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
}

impl CredentialsConfig {
    fn from_env(e: &ProfiledEnv) -> Self {
        Self {
            google_api_key: e.opt("GOOGLE_API_KEY"),
            openai_api_key: e.opt("OPENAI_API_KEY"),
            openai_base_url: e.or("OPENAI_BASE_URL", "https://api.openai.com"),
        }
    }
}

// ── LLM (answer generation) ──────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini", "openai", "ollama"
    pub provider: String,
    pub gemini_model: String,
    pub openai_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env(e: &ProfiledEnv) -> Self {
        Self {
            provider: e.or("LLM_PROVIDER", "gemini").to_lowercase(),
            gemini_model: e.or("GEMINI_MODEL", "gemini-1.5-flash"),
            openai_model: e.or("OPENAI_MODEL", "gpt-4o-mini"),
            temperature: e.parse_or("LLM_TEMPERATURE", 0.3),
            max_tokens: e.parse_or("LLM_MAX_TOKENS", 2048),
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "gemini", "openai", "ollama"
    pub provider: String,
    pub gemini_model: String,
    pub openai_model: String,
    /// Overrides the provider's default vector size.
    pub dimensions: Option<usize>,
    pub batch_size: usize,
}

impl EmbeddingConfig {
    fn from_env(e: &ProfiledEnv) -> Self {
        Self {
            provider: e.or("EMBEDDING_PROVIDER", "gemini").to_lowercase(),
            gemini_model: e.or("GEMINI_EMBEDDING_MODEL", "models/embedding-001"),
            openai_model: e.or("OPENAI_EMBEDDING_MODEL", "text-embedding-3-small"),
            dimensions: e.opt("EMBEDDING_DIMENSIONS").and_then(|v| v.trim().parse().ok()),
            batch_size: e.parse_or("EMBEDDING_BATCH_SIZE", 64),
        }
    }

    /// Vector size for the selected provider, honouring `EMBEDDING_DIMENSIONS`.
    pub fn resolved_dimensions(&self) -> usize {
        self.dimensions.unwrap_or(match self.provider.as_str() {
            "openai" => 1536,
            _ => 768,
        })
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub embedding_model: String,
}

impl OllamaConfig {
    fn from_env(e: &ProfiledEnv) -> Self {
        Self {
            url: e.or("OLLAMA_URL", "http://localhost:11434"),
            model: e.or("OLLAMA_MODEL", "llama3.2"),
            embedding_model: e.or("OLLAMA_EMBEDDING_MODEL", "nomic-embed-text"),
        }
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks.
    pub chunk_overlap: usize,
    /// Preferred split boundary.
    pub separator: String,
}

impl ChunkingConfig {
    fn from_env(e: &ProfiledEnv) -> Self {
        Self {
            chunk_size: e.parse_or("CHUNK_SIZE", 1000),
            chunk_overlap: e.parse_or("CHUNK_OVERLAP", 200),
            separator: unescape(&e.or("CHUNK_SEPARATOR", "\\n")),
        }
    }
}

// ── Retrieval / index location ────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub index_dir: PathBuf,
    /// "euclidean" or "cosine"; used when a new index is built.
    pub metric: String,
}

impl RetrievalConfig {
    fn from_env(e: &ProfiledEnv) -> Self {
        Self {
            top_k: e.parse_or("RETRIEVAL_TOP_K", 4),
            index_dir: PathBuf::from(e.or("INDEX_DIR", "vector_index")),
            metric: e.or("INDEX_METRIC", "euclidean").trim().to_lowercase(),
        }
    }
}

// ── Provider network behaviour ────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout for every provider call.
    pub timeout_secs: u64,
    /// Retries for transient provider failures (0 = fail fast).
    pub max_retries: u32,
}

impl NetworkConfig {
    fn from_env(e: &ProfiledEnv) -> Self {
        Self {
            timeout_secs: e.parse_or("PROVIDER_TIMEOUT_SECS", 60),
            max_retries: e.parse_or("PROVIDER_MAX_RETRIES", 2),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }
}
