//! Content fingerprint of a loaded corpus, used only as a cache key.
use sha2::{Digest, Sha256};

use crate::models::Document;

/// Hash `id`, `title` and `body` of every document, in order.
///
/// Each field is length-prefixed so text moving between fields changes the
/// hash. Tags, source URL and file name are not part of the fingerprint.
pub fn fingerprint(docs: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for doc in docs {
        for field in [&doc.id, &doc.title, &doc.body] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

/// Cache key for a corpus snapshot embedded with `model`.
pub fn cache_key(fingerprint: &str, model: &str) -> String {
    format!("{fingerprint}{model}")
}
