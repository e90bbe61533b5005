//! [`FsGateway`] over the local disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::DirectoryEntry;
use crate::fs::gateway::{ChangeSubscription, FsGateway};
use crate::fs::ops;
use crate::fs::watcher::DirWatcher;
use crate::path;

/// Local filesystem gateway.
///
/// Every gateway path is resolved against `root`, so `"home/me"` with a
/// root of `/` is `/home/me`. Trashed objects go to `trash_dir`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
    trash_dir: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>, trash_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            trash_dir: trash_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a gateway path.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        let rel = path::clean(rel);
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }
}

async fn blocking<T, F>(f: F) -> CoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> CoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::Io(std::io::Error::other(e)))?
}

#[async_trait]
impl FsGateway for LocalFs {
    async fn stat(&self, rel: &str) -> CoreResult<DirectoryEntry> {
        let metadata = tokio::fs::metadata(self.resolve(rel))
            .await
            .map_err(|e| CoreError::from_io(e, rel))?;
        Ok(DirectoryEntry::from_metadata(rel, &metadata))
    }

    async fn readdir(&self, rel: &str) -> CoreResult<Vec<DirectoryEntry>> {
        let abs = self.resolve(rel);
        let rel = path::clean(rel).to_string();
        blocking(move || ops::read_directory(&abs, &rel)).await
    }

    async fn rename(&self, from: &str, to: &str) -> CoreResult<()> {
        if !ops::is_valid_filename(path::last_path_fragment(to)) {
            return Err(CoreError::InvalidName(to.to_string()));
        }
        let dest = self.resolve(to);
        if tokio::fs::symlink_metadata(&dest).await.is_ok() {
            return Err(CoreError::AlreadyExists(path::clean(to).to_string()));
        }
        tokio::fs::rename(self.resolve(from), dest)
            .await
            .map_err(|e| CoreError::from_io(e, from))
    }

    async fn mkdir(&self, rel: &str) -> CoreResult<()> {
        tokio::fs::create_dir_all(self.resolve(rel))
            .await
            .map_err(|e| CoreError::from_io(e, rel))
    }

    async fn trash(&self, rel: &str) -> CoreResult<()> {
        if path::clean(rel).is_empty() {
            return Err(CoreError::InvalidName(rel.to_string()));
        }
        let target = self.resolve(rel);
        let trash_dir = self.trash_dir.clone();
        let rel = rel.to_string();
        let dest = blocking(move || ops::move_to_trash(&target, &rel, &trash_dir)).await?;
        tracing::debug!(dest = %dest.display(), "moved to trash");
        Ok(())
    }

    async fn read(&self, rel: &str) -> CoreResult<Vec<u8>> {
        tokio::fs::read(self.resolve(rel))
            .await
            .map_err(|e| CoreError::from_io(e, rel))
    }

    fn subscribe(&self, rel: &str, recursive: bool) -> CoreResult<ChangeSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = DirWatcher::new(self.root.clone(), tx)?;
        watcher.watch(&self.resolve(rel), recursive)?;
        Ok(ChangeSubscription::new(rx, Some(Box::new(watcher))))
    }
}
