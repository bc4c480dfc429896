//! Process-wide directory cache.
//!
//! Parsing a central directory is the expensive step of every import, and
//! the same archive is consulted once per module it provides. The cache
//! maps archive paths to their parsed, immutable directories for the life
//! of the process.
//!
//! First-time builds for the same path may race: parsing happens outside
//! the lock and the first insert wins. Both builders parse identical bytes
//! (the archive is read-only during imports), so a lost race is wasted
//! work, not a correctness problem, and no caller ever observes a
//! half-built directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::Result;

use super::directory::{ArchiveDirectory, read_directory};

/// Lookup-or-parse service for archive directories.
#[derive(Default)]
pub struct DirectoryCache {
    inner: Mutex<HashMap<PathBuf, Arc<ArchiveDirectory>>>,
    parses: AtomicU64,
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared process-wide instance used by importers.
    pub fn global() -> &'static DirectoryCache {
        static GLOBAL: OnceLock<DirectoryCache> = OnceLock::new();
        GLOBAL.get_or_init(DirectoryCache::new)
    }

    /// Return the cached directory for `archive_path`, parsing it on a
    /// miss. Structural parse failures are not cached; a corrupt archive
    /// fails again on every attempt.
    pub fn get_or_read(&self, archive_path: &Path) -> Result<Arc<ArchiveDirectory>> {
        if let Some(dir) = self.inner.lock().unwrap().get(archive_path) {
            return Ok(Arc::clone(dir));
        }

        let dir = Arc::new(read_directory(archive_path)?);
        self.parses.fetch_add(1, Ordering::Relaxed);

        let mut map = self.inner.lock().unwrap();
        Ok(Arc::clone(
            map.entry(archive_path.to_path_buf()).or_insert(dir),
        ))
    }

    /// Drop the cached directory for one archive. Returns whether an entry
    /// was present.
    pub fn invalidate(&self, archive_path: &Path) -> bool {
        self.inner.lock().unwrap().remove(archive_path).is_some()
    }

    /// Drop every cached directory (test isolation).
    pub fn reset(&self) {
        self.inner.lock().unwrap().clear();
    }

    /// How many directory parses this cache has performed. Instrumentation
    /// for idempotence tests.
    pub fn parse_count(&self) -> u64 {
        self.parses.load(Ordering::Relaxed)
    }
}
