//! The filesystem contract the navigation core depends on.
//!
//! [`FsGateway`] is deliberately small: stat, list, rename, create, trash,
//! read, and a change subscription. [`LocalFs`](super::local::LocalFs) is
//! the on-disk implementation; tests use an in-memory one.

use std::any::Any;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::CoreResult;
use crate::fs::entry::DirectoryEntry;

/// Class of a change notification.
///
/// OS watch APIs do not reliably tell creates, deletes and renames apart, so
/// all three arrive as [`ChangeKind::Rename`]. Content writes and metadata
/// changes arrive as [`ChangeKind::Change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Rename,
    Change,
}

/// One change notification from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Gateway-relative path of the affected object, when known.
    pub path: Option<String>,
}

impl ChangeEvent {
    pub fn rename(path: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Rename,
            path: Some(path.into()),
        }
    }

    /// Whether this event can add, remove or rename a directory entry.
    pub fn affects_listing(&self) -> bool {
        self.kind == ChangeKind::Rename
    }
}

/// A live change subscription.
///
/// Dropping the subscription releases whatever watch resource backs it.
pub struct ChangeSubscription {
    rx: UnboundedReceiver<ChangeEvent>,
    _guard: Option<Box<dyn Any + Send>>,
}

impl ChangeSubscription {
    /// Wraps a receiver, keeping `guard` alive for as long as the subscription.
    pub fn new(rx: UnboundedReceiver<ChangeEvent>, guard: Option<Box<dyn Any + Send>>) -> Self {
        Self { rx, _guard: guard }
    }

    /// A subscription fed by the returned sender. Used by in-memory gateways.
    pub fn channel() -> (UnboundedSender<ChangeEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx, None))
    }

    /// Waits for the next event; `None` once the source is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

impl std::fmt::Debug for ChangeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSubscription").finish_non_exhaustive()
    }
}

/// Asynchronous filesystem operations, addressed by gateway-relative paths.
#[async_trait]
pub trait FsGateway: Send + Sync {
    /// Stats `path`, following symlinks. The returned entry has no children.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotFound`](crate::CoreError::NotFound) or
    /// [`CoreError::PermissionDenied`](crate::CoreError::PermissionDenied).
    async fn stat(&self, path: &str) -> CoreResult<DirectoryEntry>;

    /// Lists the immediate children of the directory at `path`, unsorted.
    async fn readdir(&self, path: &str) -> CoreResult<Vec<DirectoryEntry>>;

    /// Renames or moves `from` to `to`.
    async fn rename(&self, from: &str, to: &str) -> CoreResult<()>;

    /// Creates the directory at `path`, including missing parents.
    async fn mkdir(&self, path: &str) -> CoreResult<()>;

    /// Moves `path` to the trash.
    async fn trash(&self, path: &str) -> CoreResult<()>;

    /// Reads the whole file at `path`.
    async fn read(&self, path: &str) -> CoreResult<Vec<u8>>;

    /// Subscribes to changes below `path`.
    fn subscribe(&self, path: &str, recursive: bool) -> CoreResult<ChangeSubscription>;
}
