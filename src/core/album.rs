//! Album and user records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Storage-assigned album identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub i64);

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user owning a photo library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The owner of a photo library. Supplied by the caller, never mutated by a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Root directory of the user's photos
    pub root_path: PathBuf,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            username: username.into(),
            root_path: root_path.into(),
        }
    }
}

/// A persisted album: one directory that contains photos somewhere below it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    /// Album of the enclosing directory, if it is an album itself
    pub parent: Option<AlbumId>,
    pub owner: UserId,
    /// Absolute directory path, unique per owner
    pub path: PathBuf,
}

/// An album row that has not been assigned an identifier yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlbum {
    pub title: String,
    pub parent: Option<AlbumId>,
    pub owner: UserId,
    pub path: PathBuf,
}

impl NewAlbum {
    /// Describe the album for `path`, titled after its final path segment
    pub fn for_directory(path: &Path, parent: Option<AlbumId>, owner: UserId) -> Self {
        Self {
            title: album_title(path),
            parent,
            owner,
            path: path.to_path_buf(),
        }
    }
}

/// Title for the album at `path`: its final segment, or the whole path for `/`
pub fn album_title(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
