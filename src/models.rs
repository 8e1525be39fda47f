//! Core data types shared by the loader, builder, cache and search.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One retrievable unit of knowledge loaded from the corpus directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub body: String,
    /// Originating file name, provenance only.
    #[serde(rename = "file")]
    pub source_file: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IndexError {
    #[error("{docs} documents but {embeddings} embeddings")]
    LengthMismatch { docs: usize, embeddings: usize },

    #[error("embedding {position} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        found: usize,
    },
}

/// The queryable artifact: documents positionally aligned with their vectors.
///
/// Fields are private and there are no mutating methods; a rebuild always
/// produces a new `Index`.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    embeddings: Vec<Vec<f64>>,
    docs: Vec<Document>,
    embedding_model: String,
}

impl Index {
    /// Assemble an index, checking alignment and uniform dimensionality.
    pub fn new(
        docs: Vec<Document>,
        embeddings: Vec<Vec<f64>>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, IndexError> {
        if docs.len() != embeddings.len() {
            return Err(IndexError::LengthMismatch {
                docs: docs.len(),
                embeddings: embeddings.len(),
            });
        }

        if let Some(first) = embeddings.first() {
            let expected = first.len();
            if let Some((position, v)) = embeddings
                .iter()
                .enumerate()
                .find(|(_, v)| v.len() != expected)
            {
                return Err(IndexError::DimensionMismatch {
                    position,
                    expected,
                    found: v.len(),
                });
            }
        }

        Ok(Self {
            embeddings,
            docs,
            embedding_model: embedding_model.into(),
        })
    }

    pub fn docs(&self) -> &[Document] {
        &self.docs
    }

    pub fn embeddings(&self) -> &[Vec<f64>] {
        &self.embeddings
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Vector dimensionality, or `None` for an empty index.
    pub fn dimensions(&self) -> Option<usize> {
        self.embeddings.first().map(Vec::len)
    }

    /// Iterate `(document, embedding)` pairs in index order.
    pub fn entries(&self) -> impl Iterator<Item = (&Document, &[f64])> {
        self.docs
            .iter()
            .zip(self.embeddings.iter().map(Vec::as_slice))
    }
}

/// A ranked document borrowed from an [`Index`] for the duration of one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub score: f64,
    pub document: &'a Document,
}

/// An owned search result handed back to callers of the query interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub score: f64,
    #[serde(rename = "doc")]
    pub document: Document,
}

impl From<SearchHit<'_>> for SearchResult {
    fn from(hit: SearchHit<'_>) -> Self {
        Self {
            score: hit.score,
            document: hit.document.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_doc(id: &str, body: &str) -> Document {
    Document {
        id: id.to_string(),
        title: id.to_string(),
        source_url: String::new(),
        tags: Vec::new(),
        body: body.to_string(),
        source_file: format!("{id}.md"),
    }
}
