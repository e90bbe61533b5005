//! Publish/subscribe state container.
//!
//! A [`Store`] holds the latest snapshot of some state as an `Arc<T>`.
//! Writers hand in a pure transformation of the current snapshot and the
//! result replaces it in a single assignment; readers either take the
//! current snapshot or subscribe to be woken on every publish. Snapshots
//! are never mutated after they are published.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

pub struct Store<T> {
    tx: watch::Sender<Arc<T>>,
}

impl<T> Store<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// The latest published snapshot.
    pub fn get(&self) -> Arc<T> {
        self.tx.borrow().clone()
    }

    /// A receiver that observes every subsequent publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<T>> {
        self.tx.subscribe()
    }

    /// Replaces the snapshot wholesale.
    pub fn set(&self, value: T) {
        self.tx.send_replace(Arc::new(value));
    }

    /// Publishes `f(current)` and returns it.
    ///
    /// `f` runs under the store's write lock, so concurrent writers are
    /// serialised.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Arc<T> {
        self.tx.send_modify(|current| *current = Arc::new(f(current)));
        self.get()
    }

    /// Publishes `f(current)` only if it returns `Some`.
    ///
    /// Returns whether anything was published.
    pub fn update_if(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        self.tx.send_if_modified(|current| match f(current) {
            Some(next) => {
                *current = Arc::new(next);
                true
            }
            None => false,
        })
    }

    /// Publishes `f(current)` unless it fails; on failure nothing changes.
    pub fn try_update<E>(&self, f: impl FnOnce(&T) -> Result<T, E>) -> Result<Arc<T>, E> {
        let mut failure = None;
        self.tx.send_if_modified(|current| match f(current) {
            Ok(next) => {
                *current = Arc::new(next);
                true
            }
            Err(e) => {
                failure = Some(e);
                false
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(self.get()),
        }
    }
}

impl<T: Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Store").field(&*self.get()).finish()
    }
}
