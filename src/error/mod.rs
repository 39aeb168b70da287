//! # Error Module
//!
//! Error types for the album scanner.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, users, which storage step failed
//! - **Tagged kinds** - callers tell fatal from recorded errors by variant,
//!   never by inspecting messages

use crate::core::UserId;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AlbumScanError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors produced while scanning a user's photo directory.
///
/// Only the root-path variants abort a scan. Everything else is recorded
/// and returned next to the albums that were discovered.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Photo directory for user '{user}' does not exist: {path}")]
    RootNotFound { user: String, path: PathBuf },

    #[error("Could not read photo directory for user '{user}' ({path}): {source}")]
    RootUnreadable {
        user: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to store album {path} ({step} step): {source}")]
    Storage {
        path: PathBuf,
        step: StoreStep,
        #[source]
        source: StoreError,
    },

    #[error("Failed to find albums to delete for user {owner}: {source}")]
    StaleQuery {
        owner: UserId,
        #[source]
        source: StoreError,
    },

    #[error("Failed to delete {count} old albums from database: {source}")]
    StaleDelete {
        count: usize,
        #[source]
        source: StoreError,
    },

    #[error("Failed to delete unused cache folder {path}: {source}")]
    CacheRemoval {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Whether this error stopped the scan before any work was done
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::RootNotFound { .. } | ScanError::RootUnreadable { .. }
        )
    }
}

/// The step of an album upsert transaction that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStep {
    Begin,
    Insert,
    Select,
    Commit,
}

impl fmt::Display for StoreStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreStep::Begin => write!(f, "begin"),
            StoreStep::Insert => write!(f, "insert"),
            StoreStep::Select => write!(f, "select"),
            StoreStep::Commit => write!(f, "commit"),
        }
    }
}

/// Errors from the album storage adapter
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open album database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Album row has unexpected shape in column '{column}': {reason}")]
    RowShape { column: &'static str, reason: String },

    #[error("Album database connection is poisoned at {path}. Restart the scanner.")]
    Poisoned { path: PathBuf },
}

/// A failed album upsert, tagged with the transaction step that failed
#[derive(Error, Debug)]
#[error("album upsert failed ({step} step): {source}")]
pub struct UpsertError {
    pub step: StoreStep,
    #[source]
    pub source: StoreError,
}

impl UpsertError {
    pub fn new(step: StoreStep, source: impl Into<StoreError>) -> Self {
        Self {
            step,
            source: source.into(),
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, AlbumScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_errors_are_fatal() {
        let missing = ScanError::RootNotFound {
            user: "alice".to_string(),
            path: PathBuf::from("/photos/alice"),
        };
        assert!(missing.is_fatal());

        let unreadable = ScanError::RootUnreadable {
            user: "alice".to_string(),
            path: PathBuf::from("/photos/alice"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(unreadable.is_fatal());
    }

    #[test]
    fn recorded_errors_are_not_fatal() {
        let error = ScanError::ReadDirectory {
            path: PathBuf::from("/photos/alice/2023"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(!error.is_fatal());
        assert!(error.to_string().contains("/photos/alice/2023"));
    }

    #[test]
    fn root_not_found_names_user_and_path() {
        let error = ScanError::RootNotFound {
            user: "bob".to_string(),
            path: PathBuf::from("/missing"),
        };
        let message = error.to_string();
        assert!(message.contains("bob"));
        assert!(message.contains("/missing"));
        assert!(message.contains("does not exist"));
    }

    #[test]
    fn storage_error_names_failed_step() {
        let error = ScanError::Storage {
            path: PathBuf::from("/photos/trip"),
            step: StoreStep::Commit,
            source: StoreError::Poisoned {
                path: PathBuf::from("albums.db"),
            },
        };
        let message = error.to_string();
        assert!(message.contains("/photos/trip"));
        assert!(message.contains("commit step"));
    }

    #[test]
    fn upsert_error_keeps_step() {
        let error = UpsertError::new(
            StoreStep::Select,
            StoreError::RowShape {
                column: "album_id",
                reason: "negative".to_string(),
            },
        );
        assert_eq!(error.step, StoreStep::Select);
        assert!(error.to_string().contains("album_id"));
    }
}
