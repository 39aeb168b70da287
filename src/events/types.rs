//! Event type definitions for progress reporting.

use crate::core::{AlbumId, UserId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::Notification;

/// All events emitted by the album scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Album scan events
    Scan(ScanEvent),
    /// Operator-facing notifications
    Notification(Notification),
}

/// Events during a user's album scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { user_id: UserId, root: PathBuf },
    /// A directory was stored as an album
    AlbumFound { album_id: AlbumId, path: PathBuf },
    /// An error was recorded but scanning continues
    Error { message: String },
    /// Scanning and cleanup completed
    Completed(ScanSummary),
}

/// Summary of a finished scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Albums found on disk
    pub albums: usize,
    /// Errors recorded along the way
    pub errors: usize,
    /// Stale albums removed from storage
    pub deleted: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
