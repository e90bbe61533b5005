//! Command and event types for communication between UI and core.
//!
//! The UI translates gestures into [`Command`]s, hands them to
//! [`StackManager::dispatch`](crate::nav::manager::StackManager::dispatch),
//! and gets an [`Event`] back describing the outcome. Column contents are
//! not carried here; they are observed through the stack snapshot.

use std::fmt;

use crate::error::CoreError;

/// An operation the UI requests the core to perform.
///
/// Commands flow **UI → Core**. Paths are gateway-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reset the stack to a new base directory.
    SetBase(String),
    /// Open `name` as column `index`, discarding columns from `index` on.
    Open { name: String, index: usize },
    /// Close every column from `index` on.
    Close(usize),
    /// Re-resolve every opened column.
    Reload,
    /// Rename or move `from` to `to`.
    Rename { from: String, to: String },
    /// Move `entry` into the directory `dir` (drag-and-drop).
    MoveInto { entry: String, dir: String },
    /// Create a directory.
    Mkdir(String),
    /// Move a path to the trash.
    Trash(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetBase(base) => write!(f, "open {base}"),
            Self::Open { name, .. } => write!(f, "open {name}"),
            Self::Close(index) => write!(f, "close column {index}"),
            Self::Reload => f.write_str("reload"),
            Self::Rename { from, to } => write!(f, "rename {from} to {to}"),
            Self::MoveInto { entry, dir } => write!(f, "move {entry} into {dir}"),
            Self::Mkdir(path) => write!(f, "create folder {path}"),
            Self::Trash(path) => write!(f, "move {path} to trash"),
        }
    }
}

/// A notification the core sends back to the UI.
///
/// Events flow **Core → UI**.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The command completed.
    OperationComplete {
        /// Human-readable description of the operation.
        operation: String,
    },
    /// The command failed.
    OperationFailed {
        /// Human-readable description of the operation.
        operation: String,
        /// The error message.
        error: String,
        /// The UI should interrupt the user with this failure.
        blocking: bool,
    },
}

impl Event {
    pub(crate) fn from_outcome(command: &Command, outcome: Result<(), CoreError>) -> Self {
        let operation = command.to_string();
        match outcome {
            Ok(()) => Self::OperationComplete { operation },
            Err(err) => {
                // Only rename surfaces a permission failure to the user.
                let blocking = matches!(
                    command,
                    Command::Rename { .. } | Command::MoveInto { .. }
                ) && err.is_permission_denied();
                Self::OperationFailed {
                    operation,
                    error: err.to_string(),
                    blocking,
                }
            }
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::OperationFailed { blocking: true, .. })
    }
}
