//! # Cache Module
//!
//! Remembers which directories contain photos somewhere below them.
//!
//! ## Benefits
//! - Sibling and repeated queries never walk the same subtree twice
//! - One instance is shared by every scan running in the process
//!
//! A missing entry means "unknown". Entries are overwritten freely, since a
//! directory's contents can change between scans.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-wide memo of "does this directory contain an image"
#[derive(Debug, Default)]
pub struct AlbumCache {
    entries: Mutex<HashMap<PathBuf, bool>>,
}

impl AlbumCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere never leaves a half-written entry, so a poisoned
    // map is still consistent.
    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, bool>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The remembered answer for `path`, or `None` if unknown
    pub fn lookup(&self, path: &Path) -> Option<bool> {
        self.entries().get(path).copied()
    }

    /// Record the answer for a single directory
    pub fn insert(&self, path: &Path, contains_image: bool) {
        self.entries().insert(path.to_path_buf(), contains_image);
    }

    /// Record the answer for `directory` and every ancestor up to and
    /// including `root`, under one lock.
    ///
    /// Used when an image found deep inside a walk must also answer the query
    /// for the directory the walk started from. If `directory` is not below
    /// `root`, only `directory` is recorded.
    pub fn insert_subtree(&self, directory: &Path, root: &Path, contains_image: bool) {
        let mut entries = self.entries();

        if !directory.starts_with(root) {
            entries.insert(directory.to_path_buf(), contains_image);
            return;
        }

        for ancestor in directory.ancestors() {
            entries.insert(ancestor.to_path_buf(), contains_image);
            if ancestor == root {
                break;
            }
        }
    }

    /// Record the same answer for many directories at once
    pub fn insert_all<'a, I>(&self, paths: I, contains_image: bool)
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut entries = self.entries();
        for path in paths {
            entries.insert(path.to_path_buf(), contains_image);
        }
    }

    /// Number of remembered directories
    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }
}
