//! Persisted index cache.
//!
//! The builder talks to an [`IndexCache`] rather than a fixed file, so the
//! storage policy can be swapped: [`file::FileCache`] for deployments,
//! [`memory::MemoryCache`] for tests.
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Document, Index, IndexError};

pub mod file;
pub mod memory;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode cache entry: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to encode cache entry: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("cache entry violates index invariants: {0}")]
    Invalid(#[from] IndexError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Storage for the most recently built index, addressed by cache key.
pub trait IndexCache: Send + Sync {
    /// Return the stored index only if it was stored under exactly `key`.
    fn get(&self, key: &str) -> Result<Option<Index>, CacheError>;

    /// Replace whatever is stored with `index` under `key`.
    fn put(&self, key: &str, index: &Index) -> Result<(), CacheError>;
}

/// Serialized form of an index plus the key it was built for.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub embedding_model: String,
    pub docs: Vec<Document>,
    pub embeddings: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new(key: &str, index: &Index) -> Self {
        Self {
            key: key.to_string(),
            embedding_model: index.embedding_model().to_string(),
            docs: index.docs().to_vec(),
            embeddings: index.embeddings().to_vec(),
            built_at: Some(Utc::now()),
        }
    }

    pub fn into_index(self) -> Result<Index, IndexError> {
        Index::new(self.docs, self.embeddings, self.embedding_model)
    }
}
