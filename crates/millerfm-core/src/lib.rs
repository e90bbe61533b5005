//! millerfm core library: UI-agnostic column browser logic.
//!
//! `millerfm-core` keeps the state of a Miller-column file browser: which
//! directories are opened as columns, what each of them lists, what is
//! selected, and which context menu is up. Rendering is left to the
//! frontend, which observes published snapshots and sends [`Command`]s back.
//!
//! # Modules
//!
//! - [`path`]: string path helpers every other module composes from.
//! - [`fs`]: the [`FsGateway`] trait, its on-disk implementation, watching and previews.
//! - [`store`]: publish/subscribe snapshot container.
//! - [`nav`]: the opened-column stack, its manager, and selection.
//! - [`menu`], [`input`]: context menu state, modifier keys and click timing.
//! - [`icons`], [`associations`]: icon names, lookup and memoization.
//! - [`session`]: the per-window context object tying it all together.
//! - [`config`]: TOML settings.
//! - [`event`]: command and event types for UI ↔ core communication.
//! - [`error`]: unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod associations;
pub mod config;
pub mod error;
pub mod event;
pub mod fs;
pub mod icons;
pub mod input;
pub mod menu;
pub mod nav;
pub mod path;
pub mod session;
pub mod store;

pub use associations::Associations;
pub use config::settings::Config;
pub use error::{CoreError, CoreResult};
pub use event::{Command, Event};
pub use fs::{ChangeEvent, ChangeKind, DirectoryEntry, EntryKind, FsGateway, LocalFs, TextPreview};
pub use icons::{IconCache, IconSource};
pub use input::{Click, ClickTracker, Modifiers};
pub use menu::{DropdownState, MenuOption};
pub use nav::manager::StackManager;
pub use nav::selection::SelectionSet;
pub use nav::stack::OpenedStack;
pub use session::Session;
pub use store::Store;
