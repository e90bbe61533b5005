//! Entry selection.
//!
//! [`SelectionSet`] is a plain set of entry paths. Like the rest of the
//! navigation state it is immutable: every operation returns a new set, so
//! it can live in a [`Store`](crate::store::Store) and be published whole.

use std::collections::HashSet;

use crate::input::Modifiers;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    paths: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn select(mut self, path: impl Into<String>) -> Self {
        self.paths.insert(path.into());
        self
    }

    #[must_use]
    pub fn deselect(mut self, path: &str) -> Self {
        self.paths.remove(path);
        self
    }

    #[must_use]
    pub fn toggle(self, path: &str) -> Self {
        if self.contains(path) {
            self.deselect(path)
        } else {
            self.select(path)
        }
    }

    #[must_use]
    pub fn clear(self) -> Self {
        Self::default()
    }

    /// Clears the set, then selects `path`.
    #[must_use]
    pub fn single_select(self, path: impl Into<String>) -> Self {
        Self::default().select(path)
    }

    /// Selects every path between `anchor` and `index`, inclusive.
    ///
    /// Without an anchor only `paths[index]` is selected. Indices past the
    /// end of `paths` are ignored. Existing selections are kept.
    #[must_use]
    pub fn select_range<S: AsRef<str>>(self, anchor: Option<usize>, index: usize, paths: &[S]) -> Self {
        let anchor = anchor.unwrap_or(index);
        let (lo, hi) = (anchor.min(index), anchor.max(index));
        paths
            .iter()
            .enumerate()
            .skip(lo)
            .take_while(|(i, _)| *i <= hi)
            .fold(self, |set, (_, p)| set.select(p.as_ref()))
    }

    /// Applies a plain or ctrl click on `path`.
    ///
    /// Ctrl toggles `path`; a plain click makes it the only selection.
    /// Shift clicks need the column's listing; use
    /// [`select_range`](Self::select_range) for those.
    #[must_use]
    pub fn apply_click(self, path: &str, modifiers: Modifiers) -> Self {
        if modifiers.ctrl() {
            self.toggle(path)
        } else {
            self.single_select(path)
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}
