//! Blocking filesystem helpers behind [`LocalFs`](super::local::LocalFs).
//!
//! These run on the blocking pool; nothing here touches the async runtime.
//! `rel` arguments are the gateway-relative paths used in error values.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{DirectoryEntry, EntryKind};
use crate::path;

/// Maximum recursion depth for [`copy_recursive`] to prevent symlink loops.
const MAX_COPY_DEPTH: usize = 64;

/// Reads the immediate contents of `dir` as [`DirectoryEntry`] values.
///
/// Entry kinds come from `DirEntry::file_type`, which does not follow
/// symlinks. Children whose metadata can't be read are skipped.
///
/// # Errors
///
/// - [`CoreError::NotFound`]: the path does not exist.
/// - [`CoreError::NotADirectory`]: the path is not a directory.
/// - [`CoreError::PermissionDenied`]: read access is denied.
pub fn read_directory(dir: &Path, rel: &str) -> CoreResult<Vec<DirectoryEntry>> {
    let meta = std::fs::metadata(dir).map_err(|e| CoreError::from_io(e, rel))?;
    if !meta.is_dir() {
        return Err(CoreError::NotADirectory(rel.to_string()));
    }

    let read_dir = std::fs::read_dir(dir).map_err(|e| CoreError::from_io(e, rel))?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let Ok(dir_entry) = dir_entry else { continue };
        let Ok(metadata) = dir_entry.metadata() else {
            continue;
        };
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        entries.push(DirectoryEntry::from_metadata(path::join(rel, &name), &metadata));
    }

    Ok(entries)
}

/// Rejects empty names, `.`/`..`, and names containing separators or NUL.
pub fn is_valid_filename(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains('/') || name.contains('\0') {
        return false;
    }
    #[cfg(windows)]
    if name.contains('\\') || name.contains(':') {
        return false;
    }
    true
}

/// Copies a file, symlink or directory tree to `dest`.
pub fn copy_recursive(src: &Path, dest: &Path) -> CoreResult<()> {
    copy_at_depth(src, dest, 0)
}

fn copy_at_depth(src: &Path, dest: &Path, depth: usize) -> CoreResult<()> {
    if depth > MAX_COPY_DEPTH {
        return Err(CoreError::Io(std::io::Error::other(format!(
            "maximum recursion depth ({MAX_COPY_DEPTH}) exceeded during copy"
        ))));
    }

    let meta = std::fs::symlink_metadata(src)?;
    match EntryKind::from_file_type(meta.file_type()) {
        EntryKind::Directory => {
            std::fs::create_dir_all(dest)?;
            for child in std::fs::read_dir(src)? {
                let child = child?;
                copy_at_depth(&child.path(), &dest.join(child.file_name()), depth + 1)?;
            }
        }
        EntryKind::Symlink => {
            let link_target = std::fs::read_link(src)?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(&link_target, dest)?;
            #[cfg(not(unix))]
            std::fs::copy(src, dest)?;
        }
        _ => {
            std::fs::copy(src, dest)?;
        }
    }
    Ok(())
}

/// Removes a file, symlink or directory tree without following symlinks.
pub fn remove_recursive(path: &Path) -> CoreResult<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Moves `src` to `dest`.
///
/// Attempts a fast `rename` first. If that fails for a reason other than a
/// missing source or denied access (e.g. cross-device), falls back to
/// copy + delete.
pub fn move_path(src: &Path, dest: &Path) -> CoreResult<()> {
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ) =>
        {
            Err(e.into())
        }
        Err(_) => {
            copy_recursive(src, dest)?;
            remove_recursive(src)
        }
    }
}

/// Picks a name for `name` that is free in both trash subdirectories.
///
/// Collisions get a numeric suffix before the extension: `a.txt`, `a.2.txt`, ...
pub fn unique_trash_name(files_dir: &Path, info_dir: &Path, name: &str) -> String {
    let (stem, ext) = match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    };
    let taken = |candidate: &str| {
        files_dir.join(candidate).symlink_metadata().is_ok()
            || info_dir.join(format!("{candidate}.trashinfo")).exists()
    };

    if !taken(name) {
        return name.to_string();
    }
    (2u32..)
        .map(|n| format!("{stem}.{n}{ext}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Renders a freedesktop `.trashinfo` record.
pub fn trash_info(original: &Path, deleted_at: DateTime<Local>) -> String {
    format!(
        "[Trash Info]\nPath={}\nDeletionDate={}\n",
        percent_encode_path(&original.to_string_lossy()),
        deleted_at.format("%Y-%m-%dT%H:%M:%S"),
    )
}

fn percent_encode_path(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Moves `target` into `trash_dir/files`, recording it in `trash_dir/info`.
///
/// Returns the path the target now lives at.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `target` does not exist.
/// - [`CoreError::PermissionDenied`] if the target or trash can't be written.
pub fn move_to_trash(target: &Path, rel: &str, trash_dir: &Path) -> CoreResult<PathBuf> {
    std::fs::symlink_metadata(target).map_err(|e| CoreError::from_io(e, rel))?;

    let files_dir = trash_dir.join("files");
    let info_dir = trash_dir.join("info");
    std::fs::create_dir_all(&files_dir).map_err(|e| CoreError::from_io(e, rel))?;
    std::fs::create_dir_all(&info_dir).map_err(|e| CoreError::from_io(e, rel))?;

    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CoreError::InvalidName(rel.to_string()))?;
    let trashed_name = unique_trash_name(&files_dir, &info_dir, &name);

    let info_path = info_dir.join(format!("{trashed_name}.trashinfo"));
    std::fs::write(&info_path, trash_info(target, Local::now()))?;

    let dest = files_dir.join(&trashed_name);
    if let Err(e) = move_path(target, &dest) {
        let _ = std::fs::remove_file(&info_path);
        return Err(match e {
            CoreError::Io(io) => CoreError::from_io(io, rel),
            other => other,
        });
    }
    Ok(dest)
}
