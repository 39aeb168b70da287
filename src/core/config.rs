//! Scanner configuration.

use super::AlbumId;
use std::path::PathBuf;

/// Environment variable naming the photo cache root
pub const CACHE_ROOT_ENV: &str = "PHOTO_CACHE";

/// Cache root used when `PHOTO_CACHE` is not set
pub const DEFAULT_CACHE_ROOT: &str = "./photo_cache";

/// Configuration for album scanning and cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Directory holding one derived cache folder per album
    pub cache_root: PathBuf,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from(DEFAULT_CACHE_ROOT),
        }
    }
}

impl ScannerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_cache_root(std::env::var_os(CACHE_ROOT_ENV).map(PathBuf::from))
    }

    /// Build a configuration from an optional cache root; empty means unset
    pub fn from_cache_root(cache_root: Option<PathBuf>) -> Self {
        match cache_root {
            Some(root) if !root.as_os_str().is_empty() => Self { cache_root: root },
            _ => Self::default(),
        }
    }

    /// Cache folder derived from an album
    pub fn album_cache_dir(&self, album: AlbumId) -> PathBuf {
        self.cache_root.join(album.to_string())
    }
}
