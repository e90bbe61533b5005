//! Filesystem watcher feeding [`ChangeEvent`]s to the navigation core.
//!
//! Wraps a [`notify`] watcher. Raw events are classified and forwarded
//! one-for-one; there is no debouncing here, bursts are absorbed by the
//! reload generation check in the stack manager.

use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::CoreResult;
use crate::fs::gateway::{ChangeEvent, ChangeKind};

/// Watches a single directory, reporting paths relative to `root`.
pub struct DirWatcher {
    watcher: RecommendedWatcher,
    current_dir: Option<PathBuf>,
}

impl DirWatcher {
    /// Creates a watcher that sends classified events through `tx`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Watch`](crate::CoreError::Watch) if the OS
    /// watcher cannot be initialised.
    pub fn new(root: PathBuf, tx: UnboundedSender<ChangeEvent>) -> CoreResult<Self> {
        let watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    let Some(kind) = classify(&event.kind) else {
                        return;
                    };
                    let path = event.paths.first().map(|p| relative_to(&root, p));
                    let _ = tx.send(ChangeEvent { kind, path });
                }
                Err(e) => tracing::warn!("watch error: {e}"),
            }
        })?;

        Ok(Self {
            watcher,
            current_dir: None,
        })
    }

    /// Watches `dir`, unwatching the previous directory if any.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Watch`](crate::CoreError::Watch) if the directory
    /// cannot be watched.
    pub fn watch(&mut self, dir: &Path, recursive: bool) -> CoreResult<()> {
        if let Some(prev) = self.current_dir.take() {
            let _ = self.watcher.unwatch(&prev);
        }

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        self.watcher.watch(dir, mode)?;
        self.current_dir = Some(dir.to_path_buf());
        tracing::info!(dir = %dir.display(), recursive, "watching for changes");
        Ok(())
    }

    /// The directory currently being watched.
    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }
}

/// Maps a notify event kind onto the two change classes the core knows.
///
/// Creates, removes and renames collapse into [`ChangeKind::Rename`]; an
/// unclassified event is treated the same way. Access events are dropped.
fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any => Some(ChangeKind::Rename),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Rename),
        EventKind::Modify(_) => Some(ChangeKind::Change),
        EventKind::Access(_) | EventKind::Other => None,
    }
}

fn relative_to(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    crate::path::clean(&rel.to_string_lossy()).to_string()
}
