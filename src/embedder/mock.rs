/// Mock embedder for tests and offline runs.
///
/// Generates deterministic embeddings based on text hash, with optional
/// fixed vectors per text and call counters so tests can see whether the
/// provider was reached at all.
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Embedder, EmbedderError, MAX_INPUT_CHARS, truncate_chars};

/// A mock embedder that produces deterministic vectors from text hashes.
pub struct MockEmbedder {
    pub dimensions: usize,
    max_input_chars: usize,
    fixed: HashMap<String, Vec<f64>>,
    failure: Option<String>,
    batch_calls: AtomicUsize,
    query_calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            max_input_chars: MAX_INPUT_CHARS,
            fixed: HashMap::new(),
            failure: None,
            batch_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    /// An embedder whose every call fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Truncate batch inputs to `max_input_chars` characters, as the HTTP
    /// provider does.
    #[must_use]
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Return `vector` whenever exactly `text` is embedded.
    #[must_use]
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f64>) -> Self {
        self.fixed.insert(text.into(), vector);
        self
    }

    /// Number of `embed_batch` calls so far.
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Number of `embed_one` calls so far.
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Input length of every `embed_batch` call, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }

    fn vector_for(&self, text: &str) -> Vec<f64> {
        if let Some(v) = self.fixed.get(text) {
            return v.clone();
        }

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let bytes = hasher.finish().to_le_bytes();

        let mut embedding: Vec<f64> = (0..self.dimensions)
            .map(|i| f64::from(bytes[i % 8]) / 255.0)
            .collect();

        // L2 normalize
        let norm_sq: f64 = embedding.iter().map(|v| v * v).sum();
        if norm_sq > 0.0 {
            let inv = 1.0 / norm_sq.sqrt();
            for v in &mut embedding {
                *v *= inv;
            }
        }

        embedding
    }

    fn check_failure(&self) -> Result<(), EmbedderError> {
        match &self.failure {
            Some(message) => Err(EmbedderError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_batch(
        &self,
        texts: &[String],
        _model: &str,
    ) -> Result<Vec<Vec<f64>>, EmbedderError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(texts.len());
        }
        self.check_failure()?;
        Ok(texts
            .iter()
            .map(|t| self.vector_for(truncate_chars(t, self.max_input_chars)))
            .collect())
    }

    async fn embed_one(&self, text: &str, _model: &str) -> Result<Vec<f64>, EmbedderError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.vector_for(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embed_dimensions() {
        let embedder = MockEmbedder::new(384);
        let result = embedder.embed_one("hello world", "m").await.unwrap();
        assert_eq!(result.len(), 384);
    }

    #[tokio::test]
    async fn test_mock_embed_deterministic() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.embed_one("hello", "m").await.unwrap();
        let b = embedder.embed_one("hello", "m").await.unwrap();
        assert_eq!(a, b, "same input should produce same output");
        assert_eq!(embedder.query_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_embed_normalized() {
        let embedder = MockEmbedder::new(384);
        let vec = embedder.embed_one("test normalization", "m").await.unwrap();
        let norm: f64 = vec.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!(
            (norm - 1.0).abs() < 1e-9,
            "vector should be unit length, got {norm}"
        );
    }

    #[tokio::test]
    async fn test_mock_fixed_vectors_and_counters() {
        let embedder = MockEmbedder::new(2).with_vector("tanks", vec![1.0, 0.0]);
        let texts = vec!["tanks".to_string(), "other".to_string()];
        let results = embedder.embed_batch(&texts, "m").await.unwrap();
        assert_eq!(results[0], vec![1.0, 0.0]);
        assert_eq!(results[1].len(), 2);
        assert_eq!(embedder.batch_calls(), 1);
        assert_eq!(embedder.batch_sizes(), vec![2]);
    }

    #[tokio::test]
    async fn test_mock_batch_truncates_but_query_does_not() {
        let embedder = MockEmbedder::new(4)
            .with_max_input_chars(3)
            .with_vector("abc", vec![1.0, 0.0, 0.0, 0.0]);
        let results = embedder
            .embed_batch(&["abcdef".to_string()], "m")
            .await
            .unwrap();
        assert_eq!(results[0], vec![1.0, 0.0, 0.0, 0.0]);

        let query = embedder.embed_one("abcdef", "m").await.unwrap();
        assert_ne!(query, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_mock_default_limit_matches_provider() {
        let embedder = MockEmbedder::new(2).with_vector("x".repeat(MAX_INPUT_CHARS), vec![0.0, 1.0]);
        let long = "x".repeat(MAX_INPUT_CHARS + 500);
        let results = embedder.embed_batch(&[long], "m").await.unwrap();
        assert_eq!(results[0], vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let embedder = MockEmbedder::failing("quota exceeded");
        let err = embedder.embed_one("q", "m").await.unwrap_err();
        assert!(matches!(err, EmbedderError::Unavailable(ref m) if m == "quota exceeded"));
        assert!(embedder.embed_batch(&["a".to_string()], "m").await.is_err());
    }
}
