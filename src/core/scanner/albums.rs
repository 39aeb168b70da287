//! Breadth-first album discovery for one user.

use super::containment::SubtreeClassifier;
use super::filter::ImageClassifier;
use super::walker::{walk_breadth_first, Frontier, Visitor};
use super::{report_error, ScanOutcome};
use crate::core::cache::AlbumCache;
use crate::core::config::ScannerConfig;
use crate::core::fs::{DirEntry, Filesystem, OsFilesystem};
use crate::core::reconcile::Reconciler;
use crate::core::store::AlbumStore;
use crate::core::{Album, AlbumId, NewAlbum, User};
use crate::error::{ScanError, UpsertError};
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanSummary};
use std::convert::Infallible;
use std::io;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Builder for an [`AlbumScanner`]
pub struct AlbumScannerBuilder {
    store: Arc<dyn AlbumStore>,
    fs: Option<Box<dyn Filesystem>>,
    images: ImageClassifier,
    config: Option<ScannerConfig>,
    events: Option<EventSender>,
}

impl AlbumScannerBuilder {
    /// Set the filesystem (defaults to the real one)
    pub fn filesystem(mut self, fs: Box<dyn Filesystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Set the image classifier
    pub fn images(mut self, images: ImageClassifier) -> Self {
        self.images = images;
        self
    }

    /// Set the configuration (defaults to reading the environment)
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Send progress events and notifications to this sender
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the scanner
    pub fn build(self) -> AlbumScanner {
        AlbumScanner {
            store: self.store,
            fs: self.fs.unwrap_or_else(|| Box::new(OsFilesystem)),
            images: self.images,
            config: self.config.unwrap_or_else(ScannerConfig::from_env),
            events: self.events.unwrap_or_else(null_sender),
        }
    }
}

/// Scans user libraries into album storage.
///
/// Construct once and share it: scans of different users may run on
/// different threads at the same time, each with the same [`AlbumCache`].
pub struct AlbumScanner {
    store: Arc<dyn AlbumStore>,
    fs: Box<dyn Filesystem>,
    images: ImageClassifier,
    config: ScannerConfig,
    events: EventSender,
}

impl AlbumScanner {
    /// Start building a scanner on top of `store`
    pub fn builder(store: Arc<dyn AlbumStore>) -> AlbumScannerBuilder {
        AlbumScannerBuilder {
            store,
            fs: None,
            images: ImageClassifier::new(),
            config: None,
            events: None,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Find every album below the user's root, store it, and delete stored
    /// albums that are gone from disk.
    ///
    /// Fails only when the root directory itself is missing, is not a
    /// directory or cannot be listed, before anything is written. Every later failure is recorded in the
    /// outcome and the scan carries on.
    pub fn scan_user(&self, user: &User, cache: &AlbumCache) -> Result<ScanOutcome, ScanError> {
        let started = Instant::now();

        let root_entries = match self
            .fs
            .check_dir(&user.root_path)
            .and_then(|()| self.fs.read_dir(&user.root_path))
        {
            Ok(entries) => entries,
            Err(source) => {
                let error = root_error(user, source);
                report_error(&self.events, &error);
                return Err(error);
            }
        };

        tracing::info!(user = %user.username, root = %user.root_path.display(), "Scanning albums");
        self.events.send(Event::Scan(ScanEvent::Started {
            user_id: user.id,
            root: user.root_path.clone(),
        }));

        let mut walk = AlbumWalk {
            scanner: self,
            user,
            containment: SubtreeClassifier::new(&*self.fs, &self.images, cache, &self.events),
            root_entries: Some(root_entries),
            albums: Vec::new(),
            errors: Vec::new(),
        };

        let root = ScanItem {
            path: user.root_path.clone(),
            parent: None,
        };
        if let ControlFlow::Break(never) = walk_breadth_first(root, &mut walk) {
            match never {}
        }

        let AlbumWalk {
            albums, mut errors, ..
        } = walk;

        let reconciled = Reconciler::new(&*self.store, &*self.fs, &self.config, &self.events)
            .reconcile(&albums, user);
        errors.extend(reconciled.errors);

        let outcome = ScanOutcome {
            albums,
            errors,
            deleted: reconciled.deleted,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            user = %user.username,
            albums = outcome.albums.len(),
            errors = outcome.errors.len(),
            deleted = outcome.deleted.len(),
            cached_dirs = cache.entry_count(),
            "Album scan finished"
        );
        self.events.send(Event::Scan(ScanEvent::Completed(ScanSummary {
            albums: outcome.albums.len(),
            errors: outcome.errors.len(),
            deleted: outcome.deleted.len(),
            duration_ms: outcome.duration_ms,
        })));

        Ok(outcome)
    }
}

fn root_error(user: &User, source: io::Error) -> ScanError {
    if source.kind() == io::ErrorKind::NotFound {
        ScanError::RootNotFound {
            user: user.username.clone(),
            path: user.root_path.clone(),
        }
    } else {
        ScanError::RootUnreadable {
            user: user.username.clone(),
            path: user.root_path.clone(),
            source,
        }
    }
}

/// A directory waiting to be scanned, with the album of its parent directory
#[derive(Debug)]
struct ScanItem {
    path: PathBuf,
    parent: Option<AlbumId>,
}

/// Upsert-and-link policy for one user's scan
struct AlbumWalk<'s> {
    scanner: &'s AlbumScanner,
    user: &'s User,
    containment: SubtreeClassifier<'s>,
    /// Listing taken while checking the root, consumed by the first visit
    root_entries: Option<Vec<DirEntry>>,
    albums: Vec<Album>,
    errors: Vec<ScanError>,
}

impl AlbumWalk<'_> {
    fn record(&mut self, error: ScanError) {
        report_error(&self.scanner.events, &error);
        self.scanner.events.send(Event::Scan(ScanEvent::Error {
            message: error.to_string(),
        }));
        self.errors.push(error);
    }
}

impl Visitor<ScanItem> for AlbumWalk<'_> {
    type Break = Infallible;

    fn visit(&mut self, item: ScanItem, frontier: &mut Frontier<ScanItem>) -> ControlFlow<Infallible> {
        let listing = match self.root_entries.take() {
            Some(entries) => Ok(entries),
            None => self.scanner.fs.read_dir(&item.path),
        };
        let entries = match listing {
            Ok(entries) => entries,
            Err(source) => {
                self.record(ScanError::ReadDirectory {
                    path: item.path,
                    source,
                });
                return ControlFlow::Continue(());
            }
        };

        tracing::debug!("Scanning directory: {}", item.path.display());

        let new_album = NewAlbum::for_directory(&item.path, item.parent, self.user.id);
        let album = match self.scanner.store.upsert_album(&new_album) {
            Ok(album) => album,
            Err(UpsertError { step, source }) => {
                self.record(ScanError::Storage {
                    path: item.path,
                    step,
                    source,
                });
                return ControlFlow::Continue(());
            }
        };

        self.scanner.events.send(Event::Scan(ScanEvent::AlbumFound {
            album_id: album.id,
            path: album.path.clone(),
        }));

        for entry in entries.iter().filter(|e| e.is_dir && !e.is_hidden()) {
            let sub_path = item.path.join(&entry.name);
            if self.containment.contains_photos(&sub_path) {
                frontier.push(ScanItem {
                    path: sub_path,
                    parent: Some(album.id),
                });
            }
        }

        self.albums.push(album);
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::SqliteAlbumStore;
    use crate::core::UserId;
    use crate::events::EventChannel;
    use std::fs::{self, File};
    use std::path::Path;
    use tempfile::TempDir;

    fn library() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("2023/trip")).unwrap();
        fs::create_dir_all(root.join("2023/empty")).unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        File::create(root.join("2023/trip/beach.jpg")).unwrap();
        File::create(root.join("docs/taxes.pdf")).unwrap();
        temp_dir
    }

    fn scanner(store: Arc<SqliteAlbumStore>, cache_root: &Path) -> AlbumScanner {
        AlbumScanner::builder(store)
            .config(ScannerConfig::from_cache_root(Some(cache_root.to_path_buf())))
            .build()
    }

    #[test]
    fn finds_root_and_photo_directories() {
        let temp_dir = library();
        let cache_root = TempDir::new().unwrap();
        let store = Arc::new(SqliteAlbumStore::open_in_memory().unwrap());
        let user = User::new(UserId(1), "alice", temp_dir.path());

        let outcome = scanner(store, cache_root.path())
            .scan_user(&user, &AlbumCache::new())
            .unwrap();

        let paths: Vec<_> = outcome.albums.iter().map(|a| a.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                temp_dir.path().to_path_buf(),
                temp_dir.path().join("2023"),
                temp_dir.path().join("2023/trip"),
            ]
        );
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn children_link_to_parent_album() {
        let temp_dir = library();
        let cache_root = TempDir::new().unwrap();
        let store = Arc::new(SqliteAlbumStore::open_in_memory().unwrap());
        let user = User::new(UserId(1), "alice", temp_dir.path());

        let outcome = scanner(store, cache_root.path())
            .scan_user(&user, &AlbumCache::new())
            .unwrap();

        let root = &outcome.albums[0];
        let year = &outcome.albums[1];
        let trip = &outcome.albums[2];
        assert_eq!(root.parent, None);
        assert_eq!(year.parent, Some(root.id));
        assert_eq!(trip.parent, Some(year.id));
        assert_eq!(trip.title, "trip");
    }

    #[test]
    fn missing_root_fails_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteAlbumStore::open_in_memory().unwrap());
        let user = User::new(UserId(1), "alice", temp_dir.path().join("gone"));

        let error = scanner(Arc::clone(&store), temp_dir.path())
            .scan_user(&user, &AlbumCache::new())
            .unwrap_err();

        assert!(matches!(error, ScanError::RootNotFound { .. }));
        assert!(error.is_fatal());
        assert!(store.albums_for_owner(UserId(1)).unwrap().is_empty());
    }

    /// Real filesystem whose root check always fails with `kind`
    struct LockedRootFs {
        kind: io::ErrorKind,
    }

    impl Filesystem for LockedRootFs {
        fn check_dir(&self, _path: &Path) -> io::Result<()> {
            Err(io::Error::from(self.kind))
        }

        fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
            OsFilesystem.read_dir(path)
        }

        fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
            OsFilesystem.remove_dir_all(path)
        }
    }

    #[test]
    fn unreadable_root_is_fatal_and_distinct_from_missing() {
        let temp_dir = library();
        let store = Arc::new(SqliteAlbumStore::open_in_memory().unwrap());
        let user = User::new(UserId(1), "alice", temp_dir.path());

        let error = AlbumScanner::builder(store.clone())
            .filesystem(Box::new(LockedRootFs {
                kind: io::ErrorKind::PermissionDenied,
            }))
            .config(ScannerConfig::from_cache_root(Some(temp_dir.path().join("cache"))))
            .build()
            .scan_user(&user, &AlbumCache::new())
            .unwrap_err();

        match &error {
            ScanError::RootUnreadable { user, source, .. } => {
                assert_eq!(user, "alice");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("Expected unreadable root, got {other}"),
        }
        assert!(error.is_fatal());
        assert!(store.albums_for_owner(UserId(1)).unwrap().is_empty());
    }

    #[test]
    fn file_as_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("photos.jpg");
        File::create(&file).unwrap();
        let store = Arc::new(SqliteAlbumStore::open_in_memory().unwrap());
        let user = User::new(UserId(1), "alice", &file);

        let error = scanner(Arc::clone(&store), temp_dir.path())
            .scan_user(&user, &AlbumCache::new())
            .unwrap_err();

        assert!(matches!(error, ScanError::RootUnreadable { .. }));
        assert!(store.albums_for_owner(UserId(1)).unwrap().is_empty());
    }

    #[test]
    fn emits_progress_events() {
        let temp_dir = library();
        let cache_root = TempDir::new().unwrap();
        let store = Arc::new(SqliteAlbumStore::open_in_memory().unwrap());
        let user = User::new(UserId(1), "alice", temp_dir.path());
        let (sender, receiver) = EventChannel::new();

        AlbumScanner::builder(store)
            .config(ScannerConfig::from_cache_root(Some(cache_root.path().to_path_buf())))
            .events(sender)
            .build()
            .scan_user(&user, &AlbumCache::new())
            .unwrap();

        let events: Vec<Event> = std::iter::from_fn(|| receiver.try_recv()).collect();
        let found = events
            .iter()
            .filter(|e| matches!(e, Event::Scan(ScanEvent::AlbumFound { .. })))
            .count();
        assert_eq!(found, 3);
        assert!(matches!(
            events.last(),
            Some(Event::Scan(ScanEvent::Completed(ScanSummary { albums: 3, .. })))
        ));
    }
}
