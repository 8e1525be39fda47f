/// Embedder trait and shared types for the external embedding provider.
///
/// The provider is the only loosely-typed surface the core talks to; every
/// implementation hands back plain `Vec<f64>` vectors in input order.
pub mod mock;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::EmbeddingConfig;

/// Upper bound on characters submitted per text in a batch request.
pub const MAX_INPUT_CHARS: usize = 2000;

/// Errors that can occur while talking to an embedding provider.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("embedder misconfigured: {0}")]
    Config(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Boundary to an external embedding provider.
///
/// No retries happen here; callers own retry policy. All implementations
/// must be `Send + Sync` so they can be shared behind `Arc`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed several texts. Returns one vector per input, in input order.
    /// Each text is truncated to the implementation's character limit.
    async fn embed_batch(
        &self,
        texts: &[String],
        model: &str,
    ) -> Result<Vec<Vec<f64>>, EmbedderError>;

    /// Embed a single query string. Queries are not truncated.
    async fn embed_one(&self, text: &str, model: &str) -> Result<Vec<f64>, EmbedderError>;
}

/// Borrow at most `max_chars` characters from the front of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the embedder named by `config.provider`.
pub fn create_embedder(
    config: &EmbeddingConfig,
    max_input_chars: usize,
) -> Result<Arc<dyn Embedder>, EmbedderError> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(openai::OpenAiEmbedder::from_config(
            config,
            max_input_chars,
        )?)),
        "mock" => Ok(Arc::new(
            mock::MockEmbedder::new(config.dimensions).with_max_input_chars(max_input_chars),
        )),
        other => Err(EmbedderError::Config(format!(
            "unknown embedding provider: {other}"
        ))),
    }
}
