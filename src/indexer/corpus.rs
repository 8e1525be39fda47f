//! Corpus loading: one [`Document`] per eligible file in the corpus directory.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::RagError;
use crate::frontmatter::{self, FrontMatter};
use crate::models::Document;

/// Where the corpus lives and which files belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOptions {
    pub dir: PathBuf,
    /// Content extension without the dot, e.g. `md`.
    pub extension: String,
    /// Reserved file holding the retrieval policy; never part of the corpus.
    pub policy_file: String,
}

impl CorpusOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "md".to_string(),
            policy_file: "000_system_retrieval_policy.md".to_string(),
        }
    }

    fn is_eligible(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name != self.policy_file
            && path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }
}

/// Load every eligible document, sorted by file name.
///
/// Fails with [`RagError::CorpusUnavailable`] when the directory or any
/// eligible file cannot be read; a partial corpus is never returned.
pub fn load_documents(options: &CorpusOptions) -> Result<Vec<Document>, RagError> {
    let entries = fs::read_dir(&options.dir).map_err(unavailable(options.dir.as_path()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(unavailable(options.dir.as_path()))?;
        let path = entry.path();
        if path.is_file() && options.is_eligible(&path) {
            files.push(path);
        }
    }
    files.sort();

    let mut docs = Vec::with_capacity(files.len());
    for path in files {
        let bytes = fs::read(&path).map_err(unavailable(path.as_path()))?;
        docs.push(parse_document(&path, &String::from_utf8_lossy(&bytes)));
    }

    debug!(
        "Loaded {} documents from {}",
        docs.len(),
        options.dir.display()
    );
    Ok(docs)
}

fn unavailable(path: &Path) -> impl FnOnce(std::io::Error) -> RagError {
    let path = path.to_path_buf();
    move |source| RagError::CorpusUnavailable { path, source }
}

/// Build a document from raw file content. Never fails: malformed front
/// matter degrades to file-name defaults and the whole content as body.
pub fn parse_document(path: &Path, content: &str) -> Document {
    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_file.clone());

    let (meta, body) = match frontmatter::parse(content) {
        Ok((meta, body)) => (meta.unwrap_or_default(), body),
        Err(e) => {
            warn!("Ignoring front matter in {source_file}: {e}");
            (FrontMatter::default(), content.trim().to_string())
        }
    };

    Document {
        id: meta.id.unwrap_or_else(|| stem.clone()),
        title: meta.title.unwrap_or(stem),
        source_url: meta.source_url.unwrap_or_default(),
        tags: meta.tags,
        body,
        source_file,
    }
}

/// Location of the retrieval policy file.
#[must_use]
pub fn policy_path(options: &CorpusOptions) -> PathBuf {
    options.dir.join(&options.policy_file)
}

/// Read the retrieval policy verbatim.
pub fn load_policy(options: &CorpusOptions) -> Result<String, RagError> {
    let path = policy_path(options);
    fs::read_to_string(&path).map_err(|source| RagError::PolicyUnavailable { path, source })
}
