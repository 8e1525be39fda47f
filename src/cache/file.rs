//! Single-file JSON cache with atomic replacement.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use super::{CacheEntry, CacheError, IndexCache};
use crate::models::Index;

/// Distinguishes temp files of concurrent writers in one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct FileCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read the stored entry regardless of its key. `Ok(None)` if absent.
    pub fn read_entry(&self) -> Result<Option<CacheEntry>, CacheError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// `<name>.<pid>.<n>.tmp`, unique per write across threads and processes.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        name.push(format!(".{}.{n}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError {
    let path = path.to_path_buf();
    move |source| CacheError::Write { path, source }
}

impl IndexCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<Index>, CacheError> {
        match self.read_entry()? {
            Some(entry) if entry.key == key => {
                debug!("Cache hit at {}", self.path.display());
                Ok(Some(entry.into_index()?))
            }
            Some(_) => {
                debug!("Cache key changed at {}", self.path.display());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Write to a sibling temp file, then rename over the target so readers
    /// never see a partial entry. Last writer wins.
    fn put(&self, key: &str, index: &Index) -> Result<(), CacheError> {
        let _lock = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error(parent))?;
        }

        let data =
            serde_json::to_string(&CacheEntry::new(key, index)).map_err(CacheError::Encode)?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, data).map_err(write_error(&temp_path))?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_error(&self.path)(e));
        }

        info!(
            "Persisted index of {} documents to {}",
            index.len(),
            self.path.display()
        );
        Ok(())
    }
}
