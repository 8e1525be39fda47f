use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::IndexCache;
use crate::embedder::{Embedder, EmbedderError, MAX_INPUT_CHARS, truncate_chars};
use crate::error::RagError;
use crate::indexer::corpus::{self, CorpusOptions};
use crate::indexer::fingerprint;
use crate::models::{Document, Index};

/// Number of document bodies submitted per provider request.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// What a build did, for callers that report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub documents: usize,
    pub cache_hit: bool,
    pub batches: usize,
    pub dimensions: Option<usize>,
}

/// Loads the corpus, checks the cache, and embeds on a miss.
pub struct IndexBuilder {
    corpus: CorpusOptions,
    embedder: Arc<dyn Embedder>,
    cache: Arc<dyn IndexCache>,
    batch_size: usize,
    max_input_chars: usize,
}

impl IndexBuilder {
    pub fn new(
        corpus: CorpusOptions,
        embedder: Arc<dyn Embedder>,
        cache: Arc<dyn IndexCache>,
    ) -> Self {
        Self {
            corpus,
            embedder,
            cache,
            batch_size: DEFAULT_BATCH_SIZE,
            max_input_chars: MAX_INPUT_CHARS,
        }
    }

    /// Override the batch size. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Override how many characters of each body are embedded.
    #[must_use]
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn corpus(&self) -> &CorpusOptions {
        &self.corpus
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Load the corpus without touching the cache or the provider.
    pub fn load_documents(&self) -> Result<Vec<Document>, RagError> {
        corpus::load_documents(&self.corpus)
    }

    /// Return the index for the current corpus and `model`, reusing the
    /// cached one when the corpus fingerprint and model are unchanged.
    pub async fn build_index(&self, model: &str) -> Result<Index, RagError> {
        self.build_index_with_stats(model)
            .await
            .map(|(index, _)| index)
    }

    pub async fn build_index_with_stats(
        &self,
        model: &str,
    ) -> Result<(Index, BuildStats), RagError> {
        // Corpus and cache file I/O run on the blocking pool.
        let options = self.corpus.clone();
        let docs = tokio::task::spawn_blocking(move || corpus::load_documents(&options)).await??;
        let key = fingerprint::cache_key(&fingerprint::fingerprint(&docs), model);

        let cache = Arc::clone(&self.cache);
        let lookup_key = key.clone();
        let cached = tokio::task::spawn_blocking(move || cache.get(&lookup_key)).await?;
        match cached {
            Ok(Some(index)) => {
                debug!("Index cache hit for {} documents", index.len());
                let stats = BuildStats {
                    documents: index.len(),
                    cache_hit: true,
                    batches: 0,
                    dimensions: index.dimensions(),
                };
                return Ok((index, stats));
            }
            Ok(None) => debug!("Index cache miss"),
            Err(e) => warn!("Ignoring unreadable index cache: {e}"),
        }

        info!(
            "Embedding {} documents with {model} (batch size {})",
            docs.len(),
            self.batch_size
        );

        let inputs: Vec<String> = docs
            .iter()
            .map(|d| truncate_chars(&d.body, self.max_input_chars).to_string())
            .collect();

        let mut embeddings: Vec<Vec<f64>> = Vec::with_capacity(inputs.len());
        let mut batches = 0;
        for batch in inputs.chunks(self.batch_size) {
            let vectors = self.embedder.embed_batch(batch, model).await?;
            if vectors.len() != batch.len() {
                return Err(EmbedderError::InvalidResponse(format!(
                    "batch {batches}: expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                ))
                .into());
            }
            embeddings.extend(vectors);
            batches += 1;
        }

        check_dimensions(&embeddings)?;

        let index = Index::new(docs, embeddings, model)?;
        let cache = Arc::clone(&self.cache);
        let index = tokio::task::spawn_blocking(move || cache.put(&key, &index).map(|()| index))
            .await?
            .map_err(RagError::CacheWrite)?;

        let stats = BuildStats {
            documents: index.len(),
            cache_hit: false,
            batches,
            dimensions: index.dimensions(),
        };
        Ok((index, stats))
    }
}

/// Providers must return one dimensionality for a whole build.
fn check_dimensions(embeddings: &[Vec<f64>]) -> Result<(), EmbedderError> {
    let Some(expected) = embeddings.first().map(Vec::len) else {
        return Ok(());
    };
    match embeddings.iter().position(|v| v.len() != expected) {
        Some(position) => Err(EmbedderError::InvalidResponse(format!(
            "embedding {position} has {} dimensions, expected {expected}",
            embeddings[position].len()
        ))),
        None => Ok(()),
    }
}
