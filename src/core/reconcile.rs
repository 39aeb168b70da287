//! Removes albums that disappeared from disk.
//!
//! Rows are deleted first. Cache folders of deleted albums are removed only
//! once the delete succeeded, and a folder that cannot be removed never
//! brings its row back.

use crate::core::config::ScannerConfig;
use crate::core::fs::Filesystem;
use crate::core::scanner::report_error;
use crate::core::store::AlbumStore;
use crate::core::{Album, AlbumId, User};
use crate::error::ScanError;
use crate::events::{Notification, NotificationSink};
use std::path::PathBuf;

/// Result of a reconciliation pass
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Albums removed from storage
    pub deleted: Vec<AlbumId>,
    /// Errors recorded during cleanup (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Deletes stored albums that a scan did not find
pub struct Reconciler<'a> {
    store: &'a dyn AlbumStore,
    fs: &'a dyn Filesystem,
    config: &'a ScannerConfig,
    notifier: &'a dyn NotificationSink,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        store: &'a dyn AlbumStore,
        fs: &'a dyn Filesystem,
        config: &'a ScannerConfig,
        notifier: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            store,
            fs,
            config,
            notifier,
        }
    }

    /// Delete every album of `user` whose path is not among `scanned`.
    ///
    /// An empty scan deletes nothing: a scan that found no albums at all is
    /// far more likely a read failure than an empty library.
    pub fn reconcile(&self, scanned: &[Album], user: &User) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        if scanned.is_empty() {
            tracing::info!(user = %user.username, "No albums scanned, skipping cleanup");
            return outcome;
        }

        let keep: Vec<PathBuf> = scanned.iter().map(|album| album.path.clone()).collect();

        let stale = match self.store.stale_album_ids(user.id, &keep) {
            Ok(stale) => stale,
            Err(source) => {
                self.record(
                    &mut outcome,
                    ScanError::StaleQuery {
                        owner: user.id,
                        source,
                    },
                );
                return outcome;
            }
        };

        if stale.is_empty() {
            return outcome;
        }

        // Rows stay in place on failure and are retried by the next scan
        if let Err(source) = self.store.delete_albums(&stale) {
            self.record(
                &mut outcome,
                ScanError::StaleDelete {
                    count: stale.len(),
                    source,
                },
            );
            return outcome;
        }

        tracing::info!(user = %user.username, count = stale.len(), "Deleted old albums");

        for &album in &stale {
            let cache_dir = self.config.album_cache_dir(album);
            if let Err(source) = self.fs.remove_dir_all(&cache_dir) {
                self.record(
                    &mut outcome,
                    ScanError::CacheRemoval {
                        path: cache_dir,
                        source,
                    },
                );
            }
        }

        self.notifier
            .broadcast(Notification::albums_deleted(stale.len()));
        outcome.deleted = stale;
        outcome
    }

    fn record(&self, outcome: &mut ReconcileOutcome, error: ScanError) {
        report_error(self.notifier, &error);
        outcome.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fs::{DirEntry, OsFilesystem};
    use crate::core::store::SqliteAlbumStore;
    use crate::core::{NewAlbum, UserId};
    use crate::error::{StoreError, UpsertError};
    use crate::events::{null_sender, Event, EventChannel};
    use std::io;
    use std::path::Path;
    use tempfile::TempDir;

    fn user() -> User {
        User::new(UserId(1), "alice", "/p")
    }

    fn seed(store: &SqliteAlbumStore, paths: &[&str]) -> Vec<Album> {
        paths
            .iter()
            .map(|p| {
                store
                    .upsert_album(&NewAlbum::for_directory(Path::new(p), None, UserId(1)))
                    .unwrap()
            })
            .collect()
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Broken {
        Query,
        Delete,
    }

    /// Store with one operation that always fails
    struct BrokenStore {
        inner: SqliteAlbumStore,
        broken: Broken,
    }

    impl BrokenStore {
        fn new(broken: Broken) -> Self {
            Self {
                inner: SqliteAlbumStore::open_in_memory().unwrap(),
                broken,
            }
        }

        fn failure() -> StoreError {
            StoreError::Poisoned {
                path: PathBuf::from(":memory:"),
            }
        }
    }

    impl AlbumStore for BrokenStore {
        fn upsert_album(&self, album: &NewAlbum) -> Result<Album, UpsertError> {
            self.inner.upsert_album(album)
        }

        fn stale_album_ids(
            &self,
            owner: UserId,
            keep_paths: &[PathBuf],
        ) -> Result<Vec<AlbumId>, StoreError> {
            if self.broken == Broken::Query {
                return Err(Self::failure());
            }
            self.inner.stale_album_ids(owner, keep_paths)
        }

        fn delete_albums(&self, ids: &[AlbumId]) -> Result<usize, StoreError> {
            if self.broken == Broken::Delete {
                return Err(Self::failure());
            }
            self.inner.delete_albums(ids)
        }

        fn album_by_path(&self, owner: UserId, path: &Path) -> Result<Option<Album>, StoreError> {
            self.inner.album_by_path(owner, path)
        }

        fn albums_for_owner(&self, owner: UserId) -> Result<Vec<Album>, StoreError> {
            self.inner.albums_for_owner(owner)
        }
    }

    /// Filesystem whose removals always fail
    struct StuckFs;

    impl Filesystem for StuckFs {
        fn check_dir(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }

        fn read_dir(&self, _path: &Path) -> io::Result<Vec<DirEntry>> {
            Ok(Vec::new())
        }

        fn remove_dir_all(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }

    #[test]
    fn empty_scan_deletes_nothing() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        seed(&store, &["/p/a", "/p/b"]);
        let config = ScannerConfig::default();
        let sender = null_sender();

        let outcome = Reconciler::new(&store, &OsFilesystem, &config, &sender).reconcile(&[], &user());

        assert!(outcome.deleted.is_empty());
        assert!(outcome.errors.is_empty());
        assert_eq!(store.albums_for_owner(UserId(1)).unwrap().len(), 2);
    }

    #[test]
    fn deletes_exactly_the_missing_album_and_its_cache() {
        let temp_dir = TempDir::new().unwrap();
        let config = ScannerConfig::from_cache_root(Some(temp_dir.path().to_path_buf()));
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let albums = seed(&store, &["/p/a", "/p/b", "/p/c"]);
        let (a, b, c) = (&albums[0], &albums[1], &albums[2]);

        for album in &albums {
            std::fs::create_dir_all(config.album_cache_dir(album.id).join("thumbs")).unwrap();
        }

        let sender = null_sender();
        let outcome = Reconciler::new(&store, &OsFilesystem, &config, &sender)
            .reconcile(&[a.clone(), c.clone()], &user());

        assert_eq!(outcome.deleted, vec![b.id]);
        assert!(outcome.errors.is_empty());
        assert!(!config.album_cache_dir(b.id).exists());
        assert!(config.album_cache_dir(a.id).exists());
        assert!(config.album_cache_dir(c.id).exists());

        let remaining: Vec<_> = store
            .albums_for_owner(UserId(1))
            .unwrap()
            .into_iter()
            .map(|album| album.id)
            .collect();
        assert_eq!(remaining, vec![a.id, c.id]);
    }

    #[test]
    fn cache_removal_failure_keeps_row_deleted() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let albums = seed(&store, &["/p/a", "/p/b"]);
        let config = ScannerConfig::default();
        let sender = null_sender();

        let outcome = Reconciler::new(&store, &StuckFs, &config, &sender)
            .reconcile(&albums[..1], &user());

        assert_eq!(outcome.deleted, vec![albums[1].id]);
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], ScanError::CacheRemoval { .. }));
        assert_eq!(store.albums_for_owner(UserId(1)).unwrap().len(), 1);
    }

    #[test]
    fn failed_delete_leaves_rows_and_caches_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let config = ScannerConfig::from_cache_root(Some(temp_dir.path().to_path_buf()));
        let store = BrokenStore::new(Broken::Delete);
        let albums = seed(&store.inner, &["/p/a", "/p/b"]);
        let stale_cache = config.album_cache_dir(albums[1].id);
        std::fs::create_dir_all(&stale_cache).unwrap();
        let sender = null_sender();

        let outcome = Reconciler::new(&store, &OsFilesystem, &config, &sender)
            .reconcile(&albums[..1], &user());

        assert!(outcome.deleted.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], ScanError::StaleDelete { count: 1, .. }));
        assert!(stale_cache.exists());
        assert_eq!(store.albums_for_owner(UserId(1)).unwrap().len(), 2);
    }

    #[test]
    fn failed_stale_query_deletes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = ScannerConfig::from_cache_root(Some(temp_dir.path().to_path_buf()));
        let store = BrokenStore::new(Broken::Query);
        let albums = seed(&store.inner, &["/p/a", "/p/b"]);
        let stale_cache = config.album_cache_dir(albums[1].id);
        std::fs::create_dir_all(&stale_cache).unwrap();
        let (sender, receiver) = EventChannel::new();

        let outcome = Reconciler::new(&store, &OsFilesystem, &config, &sender)
            .reconcile(&albums[..1], &user());

        assert!(outcome.deleted.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        match &outcome.errors[0] {
            ScanError::StaleQuery { owner, .. } => assert_eq!(*owner, UserId(1)),
            other => panic!("Expected stale query error, got {other}"),
        }
        assert!(stale_cache.exists());
        assert_eq!(store.albums_for_owner(UserId(1)).unwrap().len(), 2);

        let negative = std::iter::from_fn(|| receiver.try_recv())
            .filter(|event| matches!(event, Event::Notification(n) if n.negative))
            .count();
        assert_eq!(negative, 1);
    }

    #[test]
    fn successful_cleanup_is_announced() {
        let store = SqliteAlbumStore::open_in_memory().unwrap();
        let albums = seed(&store, &["/p/a", "/p/b", "/p/c"]);
        let temp_dir = TempDir::new().unwrap();
        let config = ScannerConfig::from_cache_root(Some(temp_dir.path().to_path_buf()));
        let (sender, receiver) = EventChannel::new();

        Reconciler::new(&store, &OsFilesystem, &config, &sender).reconcile(&albums[..1], &user());

        let notifications: Vec<Notification> = std::iter::from_fn(|| receiver.try_recv())
            .filter_map(|event| match event {
                Event::Notification(n) if n.positive => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].content.contains("Deleted 2 albums"));
    }
}
