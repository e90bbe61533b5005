//! Filesystem side of MillerFM.
//!
//! The navigation core only talks to the [`gateway::FsGateway`] trait.
//! [`local::LocalFs`] implements it on disk using the blocking helpers in
//! [`ops`] and the [`watcher::DirWatcher`] change source. Entries are
//! [`entry::DirectoryEntry`] values; [`preview`] turns file bytes into a
//! text preview.

pub mod entry;
pub mod gateway;
pub mod local;
pub mod ops;
pub mod preview;
pub mod watcher;

pub use entry::{DirectoryEntry, EntryKind};
pub use gateway::{ChangeEvent, ChangeKind, ChangeSubscription, FsGateway};
pub use local::LocalFs;
pub use preview::TextPreview;
