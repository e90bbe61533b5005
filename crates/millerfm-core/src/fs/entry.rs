//! Directory entry representation.

use std::fs::{FileType, Metadata};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::path;

/// What kind of filesystem object an entry is.
///
/// Exactly one kind applies to any entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
}

impl EntryKind {
    /// Classifies a [`FileType`].
    ///
    /// Symlinks are only reported when the file type came from a
    /// non-following call (`symlink_metadata`, `DirEntry::file_type`).
    pub fn from_file_type(ft: FileType) -> Self {
        if ft.is_symlink() {
            return Self::Symlink;
        }
        if ft.is_dir() {
            return Self::Directory;
        }
        if ft.is_file() {
            return Self::File;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if ft.is_block_device() {
                return Self::BlockDevice;
            }
            if ft.is_char_device() {
                return Self::CharDevice;
            }
            if ft.is_fifo() {
                return Self::Fifo;
            }
            if ft.is_socket() {
                return Self::Socket;
            }
        }
        Self::File
    }

    /// Returns `true` for [`EntryKind::Directory`].
    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }
}

/// A single filesystem object, addressed by its gateway-relative path.
///
/// Entries are rebuilt from scratch on every reload, so two entries for the
/// same path compare equal but are never the same instance. Key UI state
/// by [`DirectoryEntry::path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    name: String,
    path: String,
    kind: EntryKind,
    size: u64,
    modified: Option<SystemTime>,
    children: Vec<DirectoryEntry>,
}

impl DirectoryEntry {
    /// Creates an entry for `path`. The name is the last path fragment.
    pub fn new(path: impl Into<String>, kind: EntryKind) -> Self {
        let path = path::clean(&path.into()).to_string();
        Self {
            name: path::last_path_fragment(&path).to_string(),
            path,
            kind,
            size: 0,
            modified: None,
            children: Vec::new(),
        }
    }

    /// Creates an entry from `std::fs` metadata.
    ///
    /// Directory sizes are reported as `0`.
    pub fn from_metadata(path: impl Into<String>, metadata: &Metadata) -> Self {
        let kind = EntryKind::from_file_type(metadata.file_type());
        Self {
            size: if kind.is_dir() { 0 } else { metadata.len() },
            modified: metadata.modified().ok(),
            ..Self::new(path, kind)
        }
    }

    /// Returns a copy re-addressed to `path`, with the name re-derived from it.
    #[must_use]
    pub fn with_path(self, path: &str) -> Self {
        let path = path::clean(path).to_string();
        Self {
            name: path::last_path_fragment(&path).to_string(),
            path,
            ..self
        }
    }

    /// Returns a copy with `children` as the directory listing.
    #[must_use]
    pub fn with_children(self, children: Vec<DirectoryEntry>) -> Self {
        Self { children, ..self }
    }

    /// The last fragment of the path, exactly as stored on disk.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name normalised to NFC for display.
    ///
    /// macOS stores names decomposed; always join paths with [`name`](Self::name).
    pub fn display_name(&self) -> String {
        self.name.nfc().collect()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// The directory listing; always empty for non-directories.
    pub fn children(&self) -> &[DirectoryEntry] {
        &self.children
    }

    /// Text after the last `.` of the name, or `None` when there is no dot.
    pub fn extension(&self) -> Option<&str> {
        self.name.rfind('.').map(|i| &self.name[i + 1..])
    }
}
