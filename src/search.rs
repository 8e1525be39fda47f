//! Cosine-similarity ranking over a built [`Index`].
use crate::models::{Index, SearchHit};

/// Cosine similarity of `a` and `b`.
///
/// A zero norm on either side makes the divisor 1, so the score is 0 rather
/// than NaN. Vectors of different lengths are compared over their common
/// prefix.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { dot } else { dot / denom }
}

/// The `k` documents most similar to `query`, best first.
///
/// Equal scores keep corpus order. `k == 0` yields nothing; `k` larger
/// than the index yields every document.
pub fn top_k<'a>(index: &'a Index, query: &[f64], k: usize) -> Vec<SearchHit<'a>> {
    if k == 0 {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit<'a>> = index
        .entries()
        .map(|(document, embedding)| SearchHit {
            score: cosine_similarity(embedding, query),
            document,
        })
        .collect();

    // `sort_by` is stable, which gives the corpus-order tie-break.
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(k);
    hits
}
