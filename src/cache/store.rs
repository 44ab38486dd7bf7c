//! Disk-backed response cache.
//!
//! One [`CacheStore`] covers one namespace: a directory below the cache root
//! holding one file per key. Each file contains only the JSON-serialized
//! result, with no timestamp, TTL or checksum.
//!
//! ```text
//! <cache root>/<namespace>/<path-safe key>
//! ```
//!
//! Entries are never expired or invalidated here; deleting files by hand is
//! the only eviction path. There is no locking: two processes missing on the
//! same key will both compute and both write, and the last write wins.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::key::make_path_safe;
use crate::telemetry;
use crate::{LlmFunctionError, Result};

/// A cache namespace backed by one directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    namespace: String,
    dir: PathBuf,
}

impl CacheStore {
    /// Open `namespace` below `root`. Nothing is created until the first write.
    pub fn new(root: impl AsRef<Path>, namespace: &str) -> Self {
        let namespace = make_path_safe(namespace);
        let dir = root.as_ref().join(&namespace);
        Self { namespace, dir }
    }

    /// The (path-safe) namespace name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Directory holding this namespace's entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path of the entry for `key` after path-safety normalization.
    pub fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let file_name = make_path_safe(key);
        if file_name.is_empty() || file_name == "." || file_name == ".." {
            return Err(LlmFunctionError::InvalidInput(format!(
                "cache key {key:?} is not a usable file name"
            )));
        }
        Ok(self.dir.join(file_name))
    }

    /// Read the entry for `key`.
    ///
    /// Returns `None` when no entry exists. An entry that no longer parses
    /// (e.g. a torn concurrent write) is logged and reported as a miss so the
    /// next write replaces it.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.entry_path(key)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache entry, treating as miss");
                Ok(None)
            }
        }
    }

    /// Write (or overwrite) the entry for `key`, creating the namespace
    /// directory if needed.
    pub async fn insert<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.entry_path(key)?;
        let json = serde_json::to_string(value)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, json).await?;
        Ok(())
    }

    /// Return the cached value for `key`, or run `compute` and cache its result.
    ///
    /// `compute` is not invoked on a hit. If it fails, nothing is written and
    /// the error is returned unchanged.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get(key).await? {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "namespace" => self.namespace.clone())
                .increment(1);
            debug!(namespace = %self.namespace, key, "cache hit");
            return Ok(hit);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "namespace" => self.namespace.clone())
            .increment(1);

        let value = compute().await?;
        self.insert(key, &value).await?;
        debug!(namespace = %self.namespace, key, "cache entry written");
        Ok(value)
    }
}
