//! Navigation state for millerfm.
//!
//! [`stack::OpenedStack`] is the immutable column stack,
//! [`manager::StackManager`] drives it against a filesystem gateway, and
//! [`selection::SelectionSet`] tracks the selected entries.

pub mod manager;
pub mod selection;
pub mod stack;

#[cfg(test)]
pub(crate) mod testing;
