//! Filesystem access used by the scanners.
//!
//! The walkers only need to check a directory, list one level of it and
//! remove cache folders, so the trait stays that narrow. Tests swap in stubs
//! to inject read failures.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn new(name: impl Into<OsString>, is_dir: bool) -> Self {
        Self {
            name: name.into(),
            is_dir,
        }
    }

    /// Hidden entries start with a dot
    pub fn is_hidden(&self) -> bool {
        self.name.to_string_lossy().starts_with('.')
    }
}

/// Filesystem operations needed to scan albums
pub trait Filesystem: Send + Sync {
    /// Succeeds if `path` exists and is a directory
    fn check_dir(&self, path: &Path) -> io::Result<()>;

    /// List the direct children of a directory. Fails if `path` is not one.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Remove a directory and everything below it. Missing paths are not an error.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem, listed through walkdir
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn check_dir(&self, path: &Path) -> io::Result<()> {
        if std::fs::metadata(path)?.is_dir() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", path.display()),
            ))
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        // walkdir lists a plain file as an empty directory
        self.check_dir(path)?;

        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let kind = e.io_error().map(|e| e.kind()).unwrap_or(io::ErrorKind::Other);
                io::Error::new(kind, e.to_string())
            })?;
            // Symlinks are not followed, so a linked directory is a plain entry
            entries.push(DirEntry {
                name: entry.file_name().to_os_string(),
                is_dir: entry.file_type().is_dir(),
            });
        }

        Ok(entries)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_dir_all(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }
}
