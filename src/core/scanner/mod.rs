//! # Scanner Module
//!
//! Turns a user's photo directory into album rows.
//!
//! A directory is an album if it, or any non-hidden directory below it,
//! contains an image. The user's root directory is always an album.
//!
//! ## Example
//! ```rust,ignore
//! use album_scanner::core::{AlbumCache, AlbumScanner, SqliteAlbumStore, User, UserId};
//!
//! let store = Arc::new(SqliteAlbumStore::open(&db_path)?);
//! let scanner = AlbumScanner::builder(store).build();
//! let cache = AlbumCache::new();
//!
//! let user = User::new(UserId(1), "alice", "/srv/photos/alice");
//! let outcome = scanner.scan_user(&user, &cache)?;
//! println!("{} albums, {} errors", outcome.albums.len(), outcome.errors.len());
//! ```

mod albums;
mod containment;
mod filter;
mod walker;

pub use albums::{AlbumScanner, AlbumScannerBuilder};
pub use containment::SubtreeClassifier;
pub use filter::{ImageClassifier, ImageFormat};
pub use walker::{walk_breadth_first, Frontier, Visitor};

use crate::core::{Album, AlbumId};
use crate::error::ScanError;
use crate::events::{Notification, NotificationSink};

/// Result of scanning one user's library
#[derive(Debug)]
pub struct ScanOutcome {
    /// Albums found on disk, in breadth-first order
    pub albums: Vec<Album>,
    /// Errors that occurred during scanning and cleanup (non-fatal)
    pub errors: Vec<ScanError>,
    /// Stale albums removed from storage
    pub deleted: Vec<AlbumId>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Log an error and surface it to operators
pub(crate) fn report_error(notifier: &dyn NotificationSink, error: &ScanError) {
    tracing::warn!("{}", error);
    notifier.broadcast(Notification::scanner_error(error.to_string()));
}
