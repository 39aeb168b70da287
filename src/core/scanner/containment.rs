//! Answers "is there an image anywhere below this directory?"

use super::filter::ImageClassifier;
use super::walker::{walk_breadth_first, Frontier, Visitor};
use crate::core::cache::AlbumCache;
use crate::core::fs::Filesystem;
use crate::events::{Notification, NotificationSink};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

/// Classifies directory subtrees, memoizing answers in an [`AlbumCache`]
pub struct SubtreeClassifier<'a> {
    fs: &'a dyn Filesystem,
    images: &'a ImageClassifier,
    cache: &'a AlbumCache,
    notifier: &'a dyn NotificationSink,
}

impl<'a> SubtreeClassifier<'a> {
    pub fn new(
        fs: &'a dyn Filesystem,
        images: &'a ImageClassifier,
        cache: &'a AlbumCache,
        notifier: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            fs,
            images,
            cache,
            notifier,
        }
    }

    /// Whether `root` or any non-hidden directory below it holds an image.
    ///
    /// Never fails: unreadable directories count as empty, are reported, and
    /// keep every directory above them out of the negative cache.
    pub fn contains_photos(&self, root: &Path) -> bool {
        if let Some(cached) = self.cache.lookup(root) {
            return cached;
        }

        let mut walk = ContainmentWalk {
            classifier: self,
            root,
            visited: Vec::new(),
            unreadable: Vec::new(),
        };

        match walk_breadth_first(root.to_path_buf(), &mut walk) {
            ControlFlow::Break(found_in) => {
                self.cache.insert_subtree(&found_in, root, true);
                true
            }
            ControlFlow::Continue(()) => {
                walk.remember_negatives();
                false
            }
        }
    }
}

/// Classify-and-memoize policy for one `contains_photos` query
struct ContainmentWalk<'w, 'a> {
    classifier: &'w SubtreeClassifier<'a>,
    root: &'w Path,
    /// Directories enumerated successfully, in visit order
    visited: Vec<PathBuf>,
    /// Directories whose listing failed
    unreadable: Vec<PathBuf>,
}

impl ContainmentWalk<'_, '_> {
    /// Cache a negative answer for every fully enumerated subtree
    fn remember_negatives(&self) {
        let complete = self
            .visited
            .iter()
            .filter(|dir| !self.unreadable.iter().any(|bad| bad.starts_with(dir)))
            .map(PathBuf::as_path);

        self.classifier.cache.insert_all(complete, false);
    }
}

impl Visitor<PathBuf> for ContainmentWalk<'_, '_> {
    /// Directory that directly holds the first image found
    type Break = PathBuf;

    fn visit(&mut self, dir: PathBuf, frontier: &mut Frontier<PathBuf>) -> ControlFlow<PathBuf> {
        let entries = match self.classifier.fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                let message = format!("Could not read directory {}: {}", dir.display(), e);
                tracing::warn!(root = %self.root.display(), "{}", message);
                self.classifier
                    .notifier
                    .broadcast(Notification::scanner_error(message));
                self.unreadable.push(dir);
                return ControlFlow::Continue(());
            }
        };

        for entry in &entries {
            let path = dir.join(&entry.name);
            if entry.is_dir {
                if !entry.is_hidden() {
                    frontier.push(path);
                }
            } else if self.classifier.images.is_image(&path) {
                return ControlFlow::Break(dir);
            }
        }

        self.visited.push(dir);
        ControlFlow::Continue(())
    }
}
