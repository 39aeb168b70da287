//! Notifications broadcast to whoever is watching the scanner.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long the "albums deleted" notice stays up
const DELETED_TIMEOUT_MS: u64 = 3000;

/// Category observers use to pick a presentation. The scanner only sends messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Message,
}

/// A structured message for operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique key, lets observers update or dismiss a notification
    pub key: String,
    pub kind: NotificationKind,
    pub header: String,
    pub content: String,
    /// Reports a failure
    pub negative: bool,
    /// Reports a success
    pub positive: bool,
    /// Auto-dismiss after this many milliseconds
    pub timeout_ms: Option<u64>,
}

impl Notification {
    /// A plain message with a fresh key
    pub fn message(header: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: generate_key(),
            kind: NotificationKind::Message,
            header: header.into(),
            content: content.into(),
            negative: false,
            positive: false,
            timeout_ms: None,
        }
    }

    /// An error raised while scanning
    pub fn scanner_error(content: impl Into<String>) -> Self {
        Self {
            negative: true,
            ..Self::message("Scanner error", content)
        }
    }

    /// Stale albums were removed during cleanup
    pub fn albums_deleted(count: usize) -> Self {
        Self {
            positive: true,
            timeout_ms: Some(DELETED_TIMEOUT_MS),
            ..Self::message(
                "Deleted old albums",
                format!("Deleted {count} albums that were not found on disk"),
            )
        }
    }
}

/// Receives notifications. Delivery is best effort and never fails the caller.
pub trait NotificationSink: Send + Sync {
    fn broadcast(&self, notification: Notification);
}

fn generate_key() -> String {
    Uuid::new_v4().simple().to_string()
}
