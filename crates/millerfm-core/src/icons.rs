//! Icon resolution.
//!
//! Entries are mapped to dotted icon names (`folder.default`,
//! `file.markdown`, ...). [`IconSource`] turns a name into svg markup and
//! [`IconCache`] memoizes those lookups for the lifetime of a session.
//! Unknown names fall back to `<prefix>.default`, so `file.rust` without a
//! registered icon renders as `file.default`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::associations::Associations;
use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{DirectoryEntry, EntryKind};

pub const FOLDER_DEFAULT: &str = "folder.default";
pub const FILE_DEFAULT: &str = "file.default";

/// Folder icons. Each also gets an `.open` variant loaded from `<stem>-open.svg`.
const FOLDER_ICONS: &[(&str, &str)] = &[(FOLDER_DEFAULT, "icons/folder-default")];

const FILE_ICONS: &[(&str, &str)] = &[
    ("file.image", "icons/image"),
    (FILE_DEFAULT, "icons/file"),
    ("file.json", "icons/json"),
    ("file.javascript", "icons/javascript"),
    ("file.typescript", "icons/typescript"),
    ("file.python", "icons/python"),
    ("file.markdown", "icons/markdown"),
    ("file.shell", "icons/powershell"),
    ("file.html", "icons/html"),
    ("file.hpp", "icons/hpp"),
    ("file.h", "icons/h"),
    ("file.cpp", "icons/cpp"),
    ("file.c", "icons/c"),
    ("file.text", "icons/document"),
    ("file.git", "icons/git"),
    ("file.pythonc", "icons/python-misc"),
    ("file.css", "icons/css"),
    ("file.csv", "icons/xml"),
    ("file.xml", "icons/xml"),
    ("file.java", "icons/java"),
];

/// The icon name to draw for `entry`.
///
/// `highlighted` directories (those opened as a column) get the `.open`
/// variant of the folder icon.
pub fn icon_name_for(entry: &DirectoryEntry, highlighted: bool, associations: &Associations) -> String {
    match entry.kind() {
        EntryKind::Directory if highlighted => format!("{FOLDER_DEFAULT}.open"),
        EntryKind::Directory => FOLDER_DEFAULT.to_string(),
        EntryKind::File => entry
            .extension()
            .and_then(|ext| associations.classify_extension(ext))
            .unwrap_or(FILE_DEFAULT)
            .to_string(),
        _ => FILE_DEFAULT.to_string(),
    }
}

/// `<prefix>.default` for a dotted name, unless `name` already is that.
pub fn fallback_name(name: &str) -> Option<String> {
    let prefix = name.split('.').next().unwrap_or(name);
    let fallback = format!("{prefix}.default");
    (fallback != name).then_some(fallback)
}

/// Where each known icon's svg lives.
#[derive(Debug, Clone, Default)]
pub struct IconRegistry {
    paths: HashMap<String, PathBuf>,
}

impl IconRegistry {
    /// The built-in icon set rooted at `resource_dir`.
    pub fn builtin(resource_dir: &Path) -> Self {
        let svg = |stem: &str| resource_dir.join(format!("{stem}.svg"));
        let mut paths = HashMap::new();
        for (name, stem) in FOLDER_ICONS {
            paths.insert((*name).to_string(), svg(stem));
            paths.insert(format!("{name}.open"), svg(&format!("{stem}-open")));
        }
        for (name, stem) in FILE_ICONS {
            paths.insert((*name).to_string(), svg(stem));
        }
        debug!(count = paths.len(), dir = %resource_dir.display(), "registered icons");
        Self { paths }
    }

    #[must_use]
    pub fn with_icon(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(name.to_string(), path.into());
        self
    }

    pub fn path_of(&self, name: &str) -> Option<&Path> {
        self.paths.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Produces svg markup for an icon name.
#[async_trait]
pub trait IconSource: Send + Sync {
    /// Fails with [`CoreError::NotFound`] for names it does not know.
    async fn get_icon(&self, name: &str) -> CoreResult<String>;
}

/// Reads registered icons from disk.
#[derive(Debug, Clone)]
pub struct FileIconSource {
    registry: IconRegistry,
}

impl FileIconSource {
    pub fn new(registry: IconRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &IconRegistry {
        &self.registry
    }
}

#[async_trait]
impl IconSource for FileIconSource {
    async fn get_icon(&self, name: &str) -> CoreResult<String> {
        let path = self
            .registry
            .path_of(name)
            .ok_or_else(|| CoreError::NotFound(name.to_string()))?;
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::from_io(e, &path.display().to_string()))
    }
}

/// Memoizes an [`IconSource`].
///
/// Both hits and fallbacks are cached under the requested name, so each
/// distinct name reaches the source at most once per successful lookup.
pub struct IconCache<S: ?Sized> {
    source: Arc<S>,
    icons: Mutex<HashMap<String, Arc<str>>>,
}

impl<S: IconSource + ?Sized> IconCache<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            icons: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, name: &str) -> CoreResult<Arc<str>> {
        if let Some(icon) = self.icons.lock().await.get(name) {
            return Ok(Arc::clone(icon));
        }

        let icon: Arc<str> = match self.source.get_icon(name).await {
            Ok(svg) => svg.into(),
            Err(CoreError::NotFound(_)) => match fallback_name(name) {
                Some(fallback) => {
                    debug!(name, fallback = %fallback, "icon missing, using fallback");
                    self.source.get_icon(&fallback).await?.into()
                }
                None => return Err(CoreError::NotFound(name.to_string())),
            },
            Err(e) => return Err(e),
        };

        self.icons
            .lock()
            .await
            .insert(name.to_string(), Arc::clone(&icon));
        Ok(icon)
    }

    pub async fn len(&self) -> usize {
        self.icons.lock().await.len()
    }
}

impl<S: ?Sized> std::fmt::Debug for IconCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingSource {
        known: HashMap<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(known: &[(&'static str, &'static str)]) -> Arc<Self> {
            Arc::new(Self {
                known: known.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IconSource for CountingSource {
        async fn get_icon(&self, name: &str) -> CoreResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.known
                .get(name)
                .map(|s| s.to_string())
                .ok_or_else(|| CoreError::NotFound(name.to_string()))
        }
    }

    #[test]
    fn directories_use_folder_icons() {
        let assoc = Associations::default();
        let dir = DirectoryEntry::new("base/src", EntryKind::Directory);
        assert_eq!(icon_name_for(&dir, false, &assoc), "folder.default");
        assert_eq!(icon_name_for(&dir, true, &assoc), "folder.default.open");
    }

    #[test]
    fn files_use_their_association() {
        let assoc = Associations::default().with_extension("md", "file.markdown");
        let readme = DirectoryEntry::new("base/README.md", EntryKind::File);
        let blob = DirectoryEntry::new("base/blob.bin", EntryKind::File);
        let bare = DirectoryEntry::new("base/Makefile", EntryKind::File);

        assert_eq!(icon_name_for(&readme, true, &assoc), "file.markdown");
        assert_eq!(icon_name_for(&blob, false, &assoc), "file.default");
        assert_eq!(icon_name_for(&bare, false, &assoc), "file.default");
    }

    #[test]
    fn special_files_use_default_file_icon() {
        let fifo = DirectoryEntry::new("base/pipe", EntryKind::Fifo);
        assert_eq!(icon_name_for(&fifo, false, &Associations::default()), "file.default");
    }

    #[test]
    fn fallback_uses_prefix() {
        assert_eq!(fallback_name("file.rust").as_deref(), Some("file.default"));
        assert_eq!(
            fallback_name("folder.default.open").as_deref(),
            Some("folder.default")
        );
        assert_eq!(fallback_name("file.default"), None);
        assert_eq!(fallback_name("plain").as_deref(), Some("plain.default"));
    }

    #[test]
    fn builtin_registry_has_open_folder_variant() {
        let registry = IconRegistry::builtin(Path::new("resources"));
        assert_eq!(
            registry.path_of("folder.default.open"),
            Some(Path::new("resources/icons/folder-default-open.svg"))
        );
        assert_eq!(
            registry.path_of("file.csv"),
            Some(Path::new("resources/icons/xml.svg"))
        );
        assert_eq!(registry.len(), FOLDER_ICONS.len() * 2 + FILE_ICONS.len());
    }

    #[tokio::test]
    async fn file_source_reads_svg() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("icons")).unwrap();
        fs::write(tmp.path().join("icons/file.svg"), "<svg>file</svg>").unwrap();

        let source = FileIconSource::new(IconRegistry::builtin(tmp.path()));
        assert_eq!(source.get_icon("file.default").await.unwrap(), "<svg>file</svg>");
        assert!(matches!(
            source.get_icon("file.nope").await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            source.get_icon("file.json").await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn cache_hits_source_once() {
        let source = CountingSource::new(&[("folder.default", "<svg/>")]);
        let cache = IconCache::new(Arc::clone(&source));

        assert_eq!(&*cache.get("folder.default").await.unwrap(), "<svg/>");
        assert_eq!(&*cache.get("folder.default").await.unwrap(), "<svg/>");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_falls_back_and_remembers() {
        let source = CountingSource::new(&[("file.default", "<svg>default</svg>")]);
        let cache = IconCache::new(Arc::clone(&source));

        assert_eq!(&*cache.get("file.rust").await.unwrap(), "<svg>default</svg>");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        cache.get("file.rust").await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn cache_reports_missing_default() {
        let source = CountingSource::new(&[]);
        let cache = IconCache::new(source);
        assert!(matches!(
            cache.get("file.default").await,
            Err(CoreError::NotFound(_))
        ));
        assert!(cache.get("file.rust").await.is_err());
        assert_eq!(cache.len().await, 0);
    }
}
