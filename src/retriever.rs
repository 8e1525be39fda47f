//! Query interface: build (or reuse) the index, embed the query, rank.
use std::sync::Arc;

use tracing::debug;

use crate::cache::IndexCache;
use crate::cache::file::FileCache;
use crate::config::Config;
use crate::embedder::{Embedder, create_embedder};
use crate::error::RagError;
use crate::indexer::core::{BuildStats, IndexBuilder};
use crate::indexer::corpus;
use crate::models::{Document, SearchResult};
use crate::search;

pub struct Retriever {
    builder: IndexBuilder,
    model: String,
}

impl Retriever {
    pub fn new(builder: IndexBuilder, model: impl Into<String>) -> Self {
        Self {
            builder,
            model: model.into(),
        }
    }

    /// Wire the configured provider, file cache and corpus together.
    pub fn from_config(config: &Config) -> Result<Self, RagError> {
        let embedder = create_embedder(&config.embedding, config.max_input_chars)?;
        let cache: Arc<dyn IndexCache> = Arc::new(FileCache::new(&config.cache_path));
        let builder = IndexBuilder::new(config.corpus_options(), embedder, cache)
            .with_batch_size(config.batch_size)
            .with_max_input_chars(config.max_input_chars);
        Ok(Self::new(builder, config.embedding.model.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Top `k` documents for `query`, best first.
    ///
    /// Errors from the build or the query embedding propagate; an empty
    /// result always means the corpus produced no candidates.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>, RagError> {
        let index = self.builder.build_index(&self.model).await?;
        if k == 0 || index.is_empty() {
            return Ok(Vec::new());
        }

        let embedder: &Arc<dyn Embedder> = self.builder.embedder();
        let query_vector = embedder.embed_one(query, &self.model).await?;
        let hits = search::top_k(&index, &query_vector, k);
        debug!("Query matched {} of {} documents", hits.len(), index.len());
        Ok(hits.into_iter().map(SearchResult::from).collect())
    }

    /// The corpus as the loader currently sees it.
    pub fn documents(&self) -> Result<Vec<Document>, RagError> {
        self.builder.load_documents()
    }

    /// Build or reuse the index and report which happened.
    pub async fn rebuild(&self) -> Result<BuildStats, RagError> {
        let (_, stats) = self.builder.build_index_with_stats(&self.model).await?;
        Ok(stats)
    }

    /// The retrieval policy text, verbatim.
    pub fn policy(&self) -> Result<String, RagError> {
        corpus::load_policy(self.builder.corpus())
    }
}
