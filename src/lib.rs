//! # Album Scanner
//!
//! Keeps a photo library's album database in step with the directories on disk.
//!
//! ## Core Philosophy
//! - **Partial success is success** - one unreadable folder never hides the rest
//! - **Never delete on doubt** - an empty scan removes nothing
//! - **Rows before caches** - cache folders go only after their album rows are gone
//!
//! ## Architecture
//! - `core` - Scanning, containment cache, storage and cleanup
//! - `events` - Progress events and operator notifications (GUI-ready)
//! - `error` - Tagged error kinds

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{AlbumScanError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or server).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
