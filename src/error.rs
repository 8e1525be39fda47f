//! Error kinds surfaced by the retrieval core.
use std::path::PathBuf;

use thiserror::Error;

use crate::cache::CacheError;
use crate::embedder::EmbedderError;
use crate::models::IndexError;

/// Errors returned by index builds and searches.
///
/// Cache read failures never appear here: the builder logs them and
/// rebuilds instead.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("corpus unavailable at {}: {source}", path.display())]
    CorpusUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("retrieval policy unavailable at {}: {source}", path.display())]
    PolicyUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("embedding provider error: {0}")]
    EmbeddingProvider(#[from] EmbedderError),

    #[error("failed to persist index: {0}")]
    CacheWrite(#[source] CacheError),

    #[error("invalid index: {0}")]
    InvalidIndex(#[from] IndexError),

    #[error("blocking I/O task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}
