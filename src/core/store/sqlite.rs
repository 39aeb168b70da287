//! SQLite album store.

use super::AlbumStore;
use crate::core::{Album, AlbumId, NewAlbum, UserId};
use crate::error::{StoreError, StoreStep, UpsertError};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Stay well below SQLite's bound-parameter limit
const DELETE_CHUNK: usize = 500;

const ALBUM_COLUMNS: &str = "album_id, title, parent_album, owner_id, path";

/// SQLite-backed album storage
///
/// A single connection behind a mutex, so one store can serve scans
/// running on several threads.
pub struct SqliteAlbumStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteAlbumStore {
    /// Open or create an album database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // WAL lets readers proceed while a scan is writing
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Self::init(conn, path.to_path_buf())
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        })?;

        Self::init(conn, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, db_path: PathBuf) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE IF NOT EXISTS album (
                album_id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                parent_album INTEGER REFERENCES album(album_id) ON DELETE SET NULL,
                owner_id INTEGER NOT NULL,
                path TEXT NOT NULL,
                UNIQUE (owner_id, path)
             );
             CREATE INDEX IF NOT EXISTS idx_album_parent ON album(parent_album);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned {
            path: self.db_path.clone(),
        })
    }

    fn select_album(
        conn: &Connection,
        owner: UserId,
        path: &Path,
    ) -> Result<Option<Album>, StoreError> {
        let row = conn
            .query_row(
                &format!("SELECT {ALBUM_COLUMNS} FROM album WHERE owner_id = ?1 AND path = ?2"),
                params![owner.0, path_text(path)?],
                AlbumRow::read,
            )
            .optional()?;

        row.map(Album::try_from).transpose()
    }
}

/// Raw columns of an `album` row, before validation
#[derive(Debug)]
struct AlbumRow {
    album_id: i64,
    title: String,
    parent_album: Option<i64>,
    owner_id: i64,
    path: String,
}

impl AlbumRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            album_id: row.get("album_id")?,
            title: row.get("title")?,
            parent_album: row.get("parent_album")?,
            owner_id: row.get("owner_id")?,
            path: row.get("path")?,
        })
    }
}

/// Paths are stored as text and must round-trip exactly
fn path_text(path: &Path) -> Result<&str, StoreError> {
    path.to_str().ok_or_else(|| StoreError::RowShape {
        column: "path",
        reason: format!("not valid UTF-8: {}", path.display()),
    })
}

fn album_id(column: &'static str, value: i64) -> Result<AlbumId, StoreError> {
    if value > 0 {
        Ok(AlbumId(value))
    } else {
        Err(StoreError::RowShape {
            column,
            reason: format!("expected a positive id, got {value}"),
        })
    }
}

impl TryFrom<AlbumRow> for Album {
    type Error = StoreError;

    fn try_from(row: AlbumRow) -> Result<Self, Self::Error> {
        if row.path.is_empty() {
            return Err(StoreError::RowShape {
                column: "path",
                reason: "empty path".to_string(),
            });
        }

        Ok(Album {
            id: album_id("album_id", row.album_id)?,
            title: row.title,
            parent: row
                .parent_album
                .map(|id| album_id("parent_album", id))
                .transpose()?,
            owner: UserId(row.owner_id),
            path: PathBuf::from(row.path),
        })
    }
}

impl AlbumStore for SqliteAlbumStore {
    fn upsert_album(&self, album: &NewAlbum) -> Result<Album, UpsertError> {
        let path = path_text(&album.path).map_err(|e| UpsertError::new(StoreStep::Insert, e))?;

        let mut conn = self.lock().map_err(|e| UpsertError::new(StoreStep::Begin, e))?;
        let tx = conn
            .transaction()
            .map_err(|e| UpsertError::new(StoreStep::Begin, e))?;

        tx.execute(
            "INSERT OR IGNORE INTO album (title, parent_album, owner_id, path)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                album.title,
                album.parent.map(|id| id.0),
                album.owner.0,
                path,
            ],
        )
        .map_err(|e| UpsertError::new(StoreStep::Insert, e))?;

        // INSERT OR IGNORE does not hand back the id of an existing row
        let stored = Self::select_album(&tx, album.owner, &album.path)
            .map_err(|e| UpsertError::new(StoreStep::Select, e))?
            .ok_or_else(|| {
                UpsertError::new(StoreStep::Select, rusqlite::Error::QueryReturnedNoRows)
            })?;

        tx.commit()
            .map_err(|e| UpsertError::new(StoreStep::Commit, e))?;

        Ok(stored)
    }

    fn stale_album_ids(
        &self,
        owner: UserId,
        keep_paths: &[PathBuf],
    ) -> Result<Vec<AlbumId>, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute_batch(
            "CREATE TEMP TABLE IF NOT EXISTS scanned_path (path TEXT PRIMARY KEY);
             DELETE FROM temp.scanned_path;",
        )?;

        {
            let mut insert =
                tx.prepare("INSERT OR IGNORE INTO temp.scanned_path (path) VALUES (?1)")?;
            // A path that is not UTF-8 was never stored, so there is no row to keep
            for path in keep_paths.iter().filter_map(|path| path.to_str()) {
                insert.execute([path])?;
            }
        }

        let raw_ids: Vec<i64> = {
            let mut stmt = tx.prepare(
                "SELECT album_id FROM album
                 WHERE owner_id = ?1 AND path NOT IN (SELECT path FROM temp.scanned_path)
                 ORDER BY album_id",
            )?;
            let rows = stmt.query_map([owner.0], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };

        tx.execute("DELETE FROM temp.scanned_path", [])?;
        tx.commit()?;

        // A malformed row is skipped so the rest of the cleanup still runs
        let stale = raw_ids
            .into_iter()
            .filter_map(|id| match album_id("album_id", id) {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(owner = %owner, "Skipping stale album row: {}", e);
                    None
                }
            })
            .collect();

        Ok(stale)
    }

    fn delete_albums(&self, ids: &[AlbumId]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut deleted = 0;
        for chunk in ids.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            deleted += tx.execute(
                &format!("DELETE FROM album WHERE album_id IN ({placeholders})"),
                params_from_iter(chunk.iter().map(|id| id.0)),
            )?;
        }

        tx.commit()?;
        Ok(deleted)
    }

    fn album_by_path(&self, owner: UserId, path: &Path) -> Result<Option<Album>, StoreError> {
        let conn = self.lock()?;
        Self::select_album(&conn, owner, path)
    }

    fn albums_for_owner(&self, owner: UserId) -> Result<Vec<Album>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {ALBUM_COLUMNS} FROM album WHERE owner_id = ?1 ORDER BY album_id"
        ))?;

        let rows: Vec<AlbumRow> = stmt
            .query_map([owner.0], AlbumRow::read)?
            .collect::<Result<_, _>>()?;

        rows.into_iter().map(Album::try_from).collect()
    }
}
