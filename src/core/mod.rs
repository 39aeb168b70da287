//! # Core Module
//!
//! The album reconciliation engine.
//!
//! ## Modules
//! - `scanner` - Walks a user's directory tree and stores its albums
//! - `cache` - Remembers which directories contain photos
//! - `reconcile` - Deletes albums that vanished from disk
//! - `store` - Album persistence
//! - `fs` - Filesystem access
//! - `config` - Cache root configuration

mod album;
pub mod cache;
pub mod config;
pub mod fs;
pub mod reconcile;
pub mod scanner;
pub mod store;

// Re-export commonly used types
pub use album::{album_title, Album, AlbumId, NewAlbum, User, UserId};
pub use cache::AlbumCache;
pub use config::ScannerConfig;
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use scanner::{AlbumScanner, ScanOutcome};
pub use store::{AlbumStore, SqliteAlbumStore};
