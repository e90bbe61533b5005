//! In-memory gateway shared by the navigation and session tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Notify;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{DirectoryEntry, EntryKind};
use crate::fs::gateway::{ChangeEvent, ChangeSubscription, FsGateway};
use crate::path;

/// Pauses one gateway call until released.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct MemoryFs {
    nodes: Mutex<BTreeMap<String, EntryKind>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    denied: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
    watchers: Mutex<Vec<UnboundedSender<ChangeEvent>>>,
}

impl MemoryFs {
    /// Builds a tree from paths; a trailing `/` marks a directory.
    pub fn with_tree(paths: &[&str]) -> Arc<Self> {
        let fs = Self::default();
        for p in paths {
            if p.ends_with('/') {
                fs.add_dir(p);
            } else {
                fs.add_file(p, b"");
            }
        }
        Arc::new(fs)
    }

    pub fn add_dir(&self, p: &str) {
        let mut nodes = self.nodes.lock().unwrap();
        let mut accum = String::new();
        for fragment in path::fragments(p) {
            accum = path::join(&accum, fragment);
            nodes.insert(accum.clone(), EntryKind::Directory);
        }
    }

    pub fn add_file(&self, p: &str, content: &[u8]) {
        self.add_dir(path::parent(p));
        let p = path::clean(p).to_string();
        self.nodes.lock().unwrap().insert(p.clone(), EntryKind::File);
        self.contents.lock().unwrap().insert(p, content.to_vec());
    }

    pub fn remove(&self, p: &str) {
        let p = path::clean(p);
        let prefix = format!("{p}/");
        self.nodes
            .lock()
            .unwrap()
            .retain(|k, _| k != p && !k.starts_with(&prefix));
    }

    pub fn exists(&self, p: &str) -> bool {
        self.nodes.lock().unwrap().contains_key(path::clean(p))
    }

    /// Makes every mutation of `p` fail with `PermissionDenied`.
    pub fn deny(&self, p: &str) {
        self.denied.lock().unwrap().insert(path::clean(p).to_string());
    }

    /// Pauses the next `op` call on `p` until `release` is notified.
    pub fn gate(&self, op: &str, p: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates
            .lock()
            .unwrap()
            .insert(format!("{op}:{}", path::clean(p)), Arc::clone(&gate));
        gate
    }

    /// Sends `event` to every live subscription.
    pub fn emit(&self, event: ChangeEvent) {
        self.watchers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    async fn pass(&self, op: &str, p: &str) {
        let gate = self
            .gates
            .lock()
            .unwrap()
            .remove(&format!("{op}:{}", path::clean(p)));
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }

    fn check_allowed(&self, p: &str) -> CoreResult<()> {
        if self.denied.lock().unwrap().contains(path::clean(p)) {
            return Err(CoreError::PermissionDenied(p.to_string()));
        }
        Ok(())
    }

    fn kind_of(&self, p: &str) -> CoreResult<EntryKind> {
        self.nodes
            .lock()
            .unwrap()
            .get(path::clean(p))
            .copied()
            .ok_or_else(|| CoreError::NotFound(p.to_string()))
    }
}

#[async_trait]
impl FsGateway for MemoryFs {
    async fn stat(&self, p: &str) -> CoreResult<DirectoryEntry> {
        self.pass("stat", p).await;
        Ok(DirectoryEntry::new(p, self.kind_of(p)?))
    }

    async fn readdir(&self, p: &str) -> CoreResult<Vec<DirectoryEntry>> {
        self.pass("readdir", p).await;
        if !self.kind_of(p)?.is_dir() {
            return Err(CoreError::NotADirectory(p.to_string()));
        }
        let dir = path::clean(p);
        Ok(self
            .nodes
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.as_str() != dir && path::parent(k) == dir)
            .map(|(k, kind)| DirectoryEntry::new(k.clone(), *kind))
            .collect())
    }

    async fn rename(&self, from: &str, to: &str) -> CoreResult<()> {
        self.pass("rename", from).await;
        self.check_allowed(from)?;
        self.kind_of(from)?;
        if self.exists(to) {
            return Err(CoreError::AlreadyExists(to.to_string()));
        }
        let (from, to) = (path::clean(from), path::clean(to));
        let prefix = format!("{from}/");
        let mut nodes = self.nodes.lock().unwrap();
        let moved: Vec<(String, EntryKind)> = nodes
            .iter()
            .filter(|(k, _)| k.as_str() == from || k.starts_with(&prefix))
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        for (k, kind) in moved {
            nodes.remove(&k);
            nodes.insert(path::replace(&k, from, to), kind);
        }
        Ok(())
    }

    async fn mkdir(&self, p: &str) -> CoreResult<()> {
        self.pass("mkdir", p).await;
        self.check_allowed(path::parent(p))?;
        self.add_dir(p);
        Ok(())
    }

    async fn trash(&self, p: &str) -> CoreResult<()> {
        self.pass("trash", p).await;
        self.check_allowed(p)?;
        self.kind_of(p)?;
        self.remove(p);
        Ok(())
    }

    async fn read(&self, p: &str) -> CoreResult<Vec<u8>> {
        self.contents
            .lock()
            .unwrap()
            .get(path::clean(p))
            .cloned()
            .ok_or_else(|| CoreError::NotFound(p.to_string()))
    }

    fn subscribe(&self, _p: &str, _recursive: bool) -> CoreResult<ChangeSubscription> {
        let (tx, sub) = ChangeSubscription::channel();
        self.watchers.lock().unwrap().push(tx);
        Ok(sub)
    }
}
