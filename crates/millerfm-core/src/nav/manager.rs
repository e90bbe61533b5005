//! The opened-path stack manager.
//!
//! [`StackManager`] owns the [`OpenedStack`] store and performs every
//! navigation and mutation against an [`FsGateway`]. Each public operation
//! edits the stack and publishes it before its first await point, then
//! reconciles with the filesystem through [`StackManager::reload`].
//!
//! Reloads may overlap: a column click, a rename and a burst of change
//! notifications can all start one. Each reload takes a generation number
//! and publishes only if, at completion, it is still the newest reload and
//! the stack it resolved has not been edited since. Older results are
//! dropped.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::CoreResult;
use crate::event::{Command, Event};
use crate::fs::entry::DirectoryEntry;
use crate::fs::gateway::{ChangeSubscription, FsGateway};
use crate::nav::stack::OpenedStack;
use crate::path;
use crate::store::Store;

pub struct StackManager<G: ?Sized> {
    gateway: Arc<G>,
    store: Store<OpenedStack>,
    generation: AtomicU64,
}

impl<G: FsGateway + ?Sized + 'static> StackManager<G> {
    /// Creates a manager with an empty stack. Call [`set_base`](Self::set_base)
    /// before anything else.
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            store: Store::default(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// The latest published stack.
    pub fn snapshot(&self) -> Arc<OpenedStack> {
        self.store.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<OpenedStack>> {
        self.store.subscribe()
    }

    /// Number of reloads started so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Resets the stack to `[base]` and reloads.
    ///
    /// Calling this again with the same base still forces a fresh reload.
    pub async fn set_base(&self, base: &str) {
        tracing::info!(base, "setting base directory");
        self.store.set(OpenedStack::new(base));
        self.reload().await;
    }

    /// Opens `name` as column `index`, dropping every column from `index` on.
    ///
    /// # Errors
    ///
    /// [`IndexOutOfRange`](crate::CoreError::IndexOutOfRange) or
    /// [`InvalidName`](crate::CoreError::InvalidName); the stack is left
    /// unchanged and no reload runs.
    pub async fn open(&self, name: &str, index: usize) -> CoreResult<()> {
        self.store.try_update(|stack| stack.with_opened(name, index))?;
        self.reload().await;
        Ok(())
    }

    /// Closes every column from `index` on.
    pub async fn close(&self, index: usize) -> CoreResult<()> {
        self.store.try_update(|stack| stack.truncated(index))?;
        self.reload().await;
        Ok(())
    }

    /// Re-resolves every opened prefix and publishes the result.
    ///
    /// Prefixes that fail to stat or list are pruned from the entries; the
    /// opened fragments are kept so a later reload can pick them up again.
    /// Returns `false` when a newer reload or stack edit superseded this one.
    pub async fn reload(&self) -> bool {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = self.store.get();
        let paths = snapshot.cumulative_paths();

        let resolved = join_all(paths.iter().map(|p| self.resolve(p))).await;
        let entries: Vec<DirectoryEntry> = resolved.into_iter().flatten().collect();
        let pruned = paths.len() - entries.len();

        let published = self.store.update_if(|current| {
            let latest = self.generation.load(Ordering::SeqCst) == generation;
            if !latest || current.opened() != snapshot.opened() {
                return None;
            }
            Some(current.with_entries(entries))
        });

        if published {
            tracing::debug!(generation, columns = paths.len(), pruned, "reload published");
        } else {
            tracing::debug!(generation, "discarding superseded reload");
        }
        published
    }

    /// Renames `old_path` to `new_path`, then updates the stack to follow it.
    ///
    /// The stack is only edited once the gateway confirms the rename. A
    /// reload runs either way.
    ///
    /// # Errors
    ///
    /// Whatever the gateway reports; a permission failure is meant to be
    /// shown to the user (see [`Event::is_blocking`]).
    pub async fn rename(&self, old_path: &str, new_path: &str) -> CoreResult<()> {
        let result = self.gateway.rename(old_path, new_path).await;
        match &result {
            Ok(()) => {
                self.store.update(|stack| stack.renamed(old_path, new_path));
            }
            Err(e) => tracing::warn!(old_path, new_path, error = %e, "rename failed"),
        }
        self.reload().await;
        result
    }

    /// Moves `entry_path` into the directory `dir_path`, keeping its name.
    pub async fn move_into(&self, entry_path: &str, dir_path: &str) -> CoreResult<()> {
        let target = path::join(dir_path, path::last_path_fragment(entry_path));
        self.rename(entry_path, &target).await
    }

    /// Creates the directory `dir_path`, then reloads.
    pub async fn mkdir(&self, dir_path: &str) -> CoreResult<()> {
        let result = self.gateway.mkdir(dir_path).await;
        if let Err(e) = &result {
            tracing::warn!(dir_path, error = %e, "mkdir failed");
        }
        self.reload().await;
        result
    }

    /// Closes the column showing `doomed` (and everything deeper), trashes
    /// it, then reloads.
    ///
    /// The columns are closed before the gateway is called and stay closed
    /// if trashing fails.
    pub async fn trash(&self, doomed: &str) -> CoreResult<()> {
        self.store.update(|stack| stack.without(doomed));
        let result = self.gateway.trash(doomed).await;
        if let Err(e) = &result {
            tracing::warn!(doomed, error = %e, "trash failed");
        }
        self.reload().await;
        result
    }

    /// Runs `command` and reports the outcome as an [`Event`].
    pub async fn dispatch(&self, command: Command) -> Event {
        let outcome = match &command {
            Command::SetBase(base) => {
                self.set_base(base).await;
                Ok(())
            }
            Command::Open { name, index } => self.open(name, *index).await,
            Command::Close(index) => self.close(*index).await,
            Command::Reload => {
                self.reload().await;
                Ok(())
            }
            Command::Rename { from, to } => self.rename(from, to).await,
            Command::MoveInto { entry, dir } => self.move_into(entry, dir).await,
            Command::Mkdir(dir) => self.mkdir(dir).await,
            Command::Trash(doomed) => self.trash(doomed).await,
        };
        Event::from_outcome(&command, outcome)
    }

    /// Starts a task that reloads on every listing-affecting change.
    ///
    /// Each notification starts its own reload; superseded ones are
    /// discarded by the generation check. The task ends when the
    /// subscription closes.
    pub fn spawn_change_listener(self: &Arc<Self>, mut changes: ChangeSubscription) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = changes.recv().await {
                if !event.affects_listing() {
                    continue;
                }
                tracing::debug!(path = ?event.path, "change notification");
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    manager.reload().await;
                });
            }
        })
    }

    /// Subscribes to changes below the current base and starts a listener.
    pub fn watch_base(self: &Arc<Self>, recursive: bool) -> CoreResult<JoinHandle<()>> {
        let base = self.snapshot().base().to_string();
        let changes = self.gateway.subscribe(&base, recursive)?;
        Ok(self.spawn_change_listener(changes))
    }

    async fn resolve(&self, column: &str) -> Option<DirectoryEntry> {
        let entry = match self.gateway.stat(column).await {
            Ok(entry) => entry.with_path(column),
            Err(e) => {
                tracing::debug!(column, error = %e, "pruning unresolved column");
                return None;
            }
        };
        if !entry.is_dir() {
            return Some(entry);
        }
        match self.gateway.readdir(column).await {
            Ok(mut children) => {
                children.sort_by(listing_order);
                Some(entry.with_children(children))
            }
            Err(e) => {
                tracing::debug!(column, error = %e, "pruning unlistable column");
                None
            }
        }
    }
}

/// Directories first, then by name.
fn listing_order(a: &DirectoryEntry, b: &DirectoryEntry) -> CmpOrdering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name().cmp(b.name()))
}
