//! # Store Module
//!
//! Persists albums in a relational database.
//!
//! ## Backends
//! - `SqliteAlbumStore` - SQLite, on disk or in memory

mod sqlite;

pub use sqlite::SqliteAlbumStore;

use super::{Album, AlbumId, NewAlbum, UserId};
use crate::error::{StoreError, UpsertError};
use std::path::{Path, PathBuf};

/// Album storage used by the scanner and reconciler
pub trait AlbumStore: Send + Sync {
    /// Insert the album unless a row with the same owner and path exists,
    /// then return the stored row.
    ///
    /// Runs in its own transaction. On failure nothing is written and the
    /// error names the step that failed.
    fn upsert_album(&self, album: &NewAlbum) -> Result<Album, UpsertError>;

    /// Albums of `owner` whose path is not in `keep_paths`
    fn stale_album_ids(&self, owner: UserId, keep_paths: &[PathBuf])
        -> Result<Vec<AlbumId>, StoreError>;

    /// Delete the given albums in one statement, returning the number removed
    fn delete_albums(&self, ids: &[AlbumId]) -> Result<usize, StoreError>;

    /// Look up one album by owner and path
    fn album_by_path(&self, owner: UserId, path: &Path) -> Result<Option<Album>, StoreError>;

    /// All albums of an owner, ordered by id
    fn albums_for_owner(&self, owner: UserId) -> Result<Vec<Album>, StoreError>;
}
