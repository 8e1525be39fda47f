/// Configuration module for ragindex.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::embedder::MAX_INPUT_CHARS;
use crate::indexer::corpus::CorpusOptions;

/// Environment variable that overrides `embedding.model`.
pub const EMBED_MODEL_ENV: &str = "OPENAI_EMBED_MODEL";

const DEFAULT_CONFIG_PATH: &str = "ragindex.json";

// ── Default value functions ──────────────────────────────────────────

fn default_corpus_dir() -> String {
    "./public/rag_data".to_string()
}

fn default_cache_path() -> String {
    "./.cache/index.json".to_string()
}

fn default_content_extension() -> String {
    "md".to_string()
}

fn default_policy_file() -> String {
    "000_system_retrieval_policy.md".to_string()
}

fn default_search_top_k() -> usize {
    5
}

fn default_batch_size() -> usize {
    64
}

fn default_max_input_chars() -> usize {
    MAX_INPUT_CHARS
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model_name() -> String {
    "text-embedding-3-small".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_dimensions() -> usize {
    1536
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: String,

    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    #[serde(default = "default_content_extension")]
    pub content_extension: String,

    /// Reserved file in `corpus_dir` holding the retrieval policy.
    #[serde(default = "default_policy_file")]
    pub policy_file: String,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// `openai` or `mock`.
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model_name")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Only used by the mock provider.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            cache_path: default_cache_path(),
            content_extension: default_content_extension(),
            policy_file: default_policy_file(),
            search_top_k: default_search_top_k(),
            batch_size: default_batch_size(),
            max_input_chars: default_max_input_chars(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model_name(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            dimensions: default_dimensions(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"ragindex.json"`.
    /// If the file does not exist, returns a default config and generates a
    /// template when the default path was used. Invalid JSON falls back to
    /// defaults with a warning.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            DEFAULT_CONFIG_PATH
        } else {
            config_path
        };

        let mut cfg = if !std::path::Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == DEFAULT_CONFIG_PATH {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }
            cfg
        } else {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {path}"))?;

            match serde_json::from_str(&data) {
                Ok(c) => {
                    info!("Loaded configuration from {path}");
                    c
                }
                Err(e) => {
                    warn!("Invalid JSON in {path}: {e}");
                    warn!("Using default configuration");
                    Self::default()
                }
            }
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// `OPENAI_EMBED_MODEL` replaces the configured model when set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var(EMBED_MODEL_ENV) {
            self.override_model(&model);
        }
    }

    fn override_model(&mut self, model: &str) {
        let model = model.trim();
        if !model.is_empty() {
            info!("Embedding model overridden by {EMBED_MODEL_ENV}: {model}");
            self.embedding.model = model.to_string();
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.batch_size > 0, "batch_size must be positive");
        anyhow::ensure!(self.max_input_chars > 0, "max_input_chars must be positive");
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            !self.content_extension.is_empty(),
            "content_extension must not be empty"
        );
        anyhow::ensure!(
            !self.embedding.model.is_empty(),
            "embedding.model must not be empty"
        );
        anyhow::ensure!(
            self.embedding.dimensions > 0,
            "embedding.dimensions must be positive"
        );
        Ok(())
    }

    /// Loader options derived from this configuration.
    #[must_use]
    pub fn corpus_options(&self) -> CorpusOptions {
        CorpusOptions {
            dir: PathBuf::from(&self.corpus_dir),
            extension: self.content_extension.clone(),
            policy_file: self.policy_file.clone(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
