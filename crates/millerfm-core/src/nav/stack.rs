//! The opened-path stack snapshot.
//!
//! [`OpenedStack`] is what columns render from: the breadcrumb of opened
//! fragments (`opened[0]` is the base directory, every later fragment is a
//! child name of the one before) and the resolved entry for each prefix.
//! Every transition returns a **new** snapshot; published snapshots are
//! never mutated.

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::DirectoryEntry;
use crate::fs::ops::is_valid_filename;
use crate::path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenedStack {
    base: String,
    opened: Vec<String>,
    entries: Vec<DirectoryEntry>,
}

impl OpenedStack {
    /// A fresh stack holding only `base`, with nothing resolved yet.
    pub fn new(base: &str) -> Self {
        let base = path::clean(base).to_string();
        Self {
            opened: vec![base.clone()],
            base,
            entries: Vec::new(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The opened fragments, base first.
    pub fn opened(&self) -> &[String] {
        &self.opened
    }

    /// Resolved entries, one per opened prefix that still exists.
    ///
    /// This is the sequence to render from. It can be shorter than
    /// [`opened`](Self::opened) while a reload is in flight, or after a
    /// reload pruned prefixes that no longer resolve.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn depth(&self) -> usize {
        self.opened.len()
    }

    /// `true` when every opened prefix has a resolved entry.
    pub fn is_settled(&self) -> bool {
        self.entries.len() == self.opened.len()
    }

    /// The full path of every opened prefix: `[base, base/a, base/a/b, ...]`.
    pub fn cumulative_paths(&self) -> Vec<String> {
        path::cumulative(&self.opened)
    }

    /// The path of the deepest opened fragment.
    pub fn current_path(&self) -> String {
        self.cumulative_paths().pop().unwrap_or_default()
    }

    /// Drill-down: keeps `opened[..index]` and appends `name`.
    ///
    /// Resolved entries for the discarded columns are dropped; the next
    /// reload resolves the new one.
    ///
    /// # Errors
    ///
    /// - [`CoreError::IndexOutOfRange`] if `index > depth()`.
    /// - [`CoreError::InvalidName`] if `name` is empty, or is not a plain
    ///   file name when `index > 0`.
    pub fn with_opened(&self, name: &str, index: usize) -> CoreResult<Self> {
        self.check_index(index)?;
        let name = path::clean(name);
        let valid = if index == 0 {
            !name.is_empty()
        } else {
            is_valid_filename(name)
        };
        if !valid {
            return Err(CoreError::InvalidName(name.to_string()));
        }

        let mut opened = self.opened[..index].to_vec();
        opened.push(name.to_string());
        let base = if index == 0 {
            name.to_string()
        } else {
            self.base.clone()
        };
        let entries = self.entries_on(&opened);
        Ok(Self {
            base,
            opened,
            entries,
        })
    }

    /// Keeps only `opened[..index]`.
    ///
    /// # Errors
    ///
    /// [`CoreError::IndexOutOfRange`] if `index > depth()`.
    pub fn truncated(&self, index: usize) -> CoreResult<Self> {
        self.check_index(index)?;
        Ok(self.truncated_to(index))
    }

    /// Applies a completed rename of `old_path` to `new_path`.
    ///
    /// A rename within the same parent swaps the matching fragment for the
    /// new name and keeps every deeper column. A move to another parent
    /// truncates the stack just before the moved fragment. Only the first
    /// prefix equal to `old_path` is considered; a stack that never opened
    /// `old_path` is returned unchanged.
    #[must_use]
    pub fn renamed(&self, old_path: &str, new_path: &str) -> Self {
        let Some(index) = path::position_of(&self.opened, old_path) else {
            return self.clone();
        };

        if path::parent(old_path) != path::parent(new_path) {
            return self.truncated_to(index);
        }

        let mut next = self.clone();
        if index == 0 {
            // The base is a full path, not a single fragment.
            next.base = path::clean(new_path).to_string();
            next.opened[0] = next.base.clone();
        } else {
            next.opened[index] = path::last_path_fragment(new_path).to_string();
        }
        next
    }

    /// Truncates at the first prefix equal to `removed`, dropping it and
    /// everything below. Unchanged if `removed` was never opened.
    #[must_use]
    pub fn without(&self, removed: &str) -> Self {
        match path::position_of(&self.opened, removed) {
            Some(index) => self.truncated_to(index),
            None => self.clone(),
        }
    }

    /// Returns a copy with `entries` as the resolved sequence.
    #[must_use]
    pub fn with_entries(&self, entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            ..self.clone()
        }
    }

    fn truncated_to(&self, index: usize) -> Self {
        let opened = self.opened[..index].to_vec();
        Self {
            base: self.base.clone(),
            entries: self.entries_on(&opened),
            opened,
        }
    }

    /// The resolved entries whose path is still one of `opened`'s prefixes.
    fn entries_on(&self, opened: &[String]) -> Vec<DirectoryEntry> {
        let chain = path::cumulative(opened);
        self.entries
            .iter()
            .filter(|e| chain.iter().any(|p| p == e.path()))
            .cloned()
            .collect()
    }

    fn check_index(&self, index: usize) -> CoreResult<()> {
        if index > self.opened.len() {
            return Err(CoreError::IndexOutOfRange {
                index,
                len: self.opened.len(),
            });
        }
        Ok(())
    }
}
