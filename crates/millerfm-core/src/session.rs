//! A browsing session.
//!
//! [`Session`] is the context object a frontend holds for one window. It
//! owns the stack manager, the selection and dropdown stores, the icon cache
//! and the background tasks (change listener, command worker). Nothing here
//! is process-global, so several sessions can run side by side.
//!
//! Commands submitted with [`Session::submit`] run on their own tasks; their
//! outcomes arrive on the event receiver returned by [`Session::open`].

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::associations::{self, Associations};
use crate::config::settings::Config;
use crate::error::{CoreError, CoreResult};
use crate::event::{Command, Event};
use crate::fs::entry::DirectoryEntry;
use crate::fs::gateway::FsGateway;
use crate::fs::local::LocalFs;
use crate::fs::preview::{read_text_preview, TextPreview};
use crate::icons::{icon_name_for, FileIconSource, IconCache, IconRegistry, IconSource};
use crate::input::{ClickTracker, Modifiers};
use crate::menu::{self, DropdownState};
use crate::nav::manager::StackManager;
use crate::nav::selection::SelectionSet;
use crate::nav::stack::OpenedStack;
use crate::path;
use crate::store::Store;

/// The last plain or ctrl click, used as the start of shift-click ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    column: usize,
    index: usize,
}

pub struct Session {
    manager: Arc<StackManager<dyn FsGateway>>,
    selection: Store<SelectionSet>,
    anchor: Store<Option<Anchor>>,
    modifiers: Store<Modifiers>,
    dropdown: Arc<Store<DropdownState>>,
    icons: IconCache<dyn IconSource>,
    associations: Associations,
    config: Config,
    commands: UnboundedSender<Command>,
    worker: JoinHandle<()>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Builds a session over the local filesystem as described by `config`.
    ///
    /// A missing associations file is tolerated; every file then gets the
    /// default icon.
    pub async fn from_config(config: Config) -> CoreResult<(Self, UnboundedReceiver<Event>)> {
        let gateway = Arc::new(LocalFs::new(&config.general.root, &config.trash.dir));
        let icons = Arc::new(FileIconSource::new(IconRegistry::builtin(
            &config.icons.resource_dir,
        )));
        let associations = match Associations::load(&config.associations.file) {
            Ok(associations) => associations,
            Err(CoreError::NotFound(file)) => {
                warn!(file = %file, "associations file missing, using defaults");
                Associations::default()
            }
            Err(e) => return Err(e),
        };
        Self::open(gateway, icons, associations, config).await
    }

    /// Opens `config.general.base_dir`, starts watching it if enabled and
    /// starts the command worker.
    pub async fn open(
        gateway: Arc<dyn FsGateway>,
        icons: Arc<dyn IconSource>,
        associations: Associations,
        config: Config,
    ) -> CoreResult<(Self, UnboundedReceiver<Event>)> {
        let manager: Arc<StackManager<dyn FsGateway>> = Arc::new(StackManager::new(gateway));
        manager.set_base(&config.general.base_dir).await;

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let worker = spawn_command_worker(Arc::clone(&manager), command_rx, event_tx);

        let session = Self {
            manager,
            selection: Store::default(),
            anchor: Store::default(),
            modifiers: Store::default(),
            dropdown: Arc::new(Store::default()),
            icons: IconCache::new(icons),
            associations,
            config,
            commands,
            worker,
            listener: Mutex::new(None),
        };
        session.rewatch().await?;
        info!(base = session.snapshot().base(), "session opened");
        Ok((session, events))
    }

    pub fn manager(&self) -> &Arc<StackManager<dyn FsGateway>> {
        &self.manager
    }

    pub fn snapshot(&self) -> Arc<OpenedStack> {
        self.manager.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<OpenedStack>> {
        self.manager.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn associations(&self) -> &Associations {
        &self.associations
    }

    /// Queues `command`; its [`Event`] arrives on the session's receiver.
    pub fn submit(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            warn!(command = %e.0, "command worker stopped, dropping command");
        }
    }

    /// Moves the base to `base` and re-targets the change watcher.
    pub async fn set_base(&self, base: &str) -> CoreResult<()> {
        self.manager.set_base(base).await;
        self.anchor.set(None);
        self.selection.set(SelectionSet::default());
        self.rewatch().await
    }

    async fn rewatch(&self) -> CoreResult<()> {
        let mut listener = self.listener.lock().await;
        if let Some(old) = listener.take() {
            old.abort();
        }
        if self.config.watch.enabled {
            *listener = Some(self.manager.watch_base(self.config.watch.recursive)?);
        }
        Ok(())
    }

    // Selection

    pub fn selection(&self) -> Arc<SelectionSet> {
        self.selection.get()
    }

    pub fn subscribe_selection(&self) -> watch::Receiver<Arc<SelectionSet>> {
        self.selection.subscribe()
    }

    pub fn key_down(&self, key: &str) {
        self.modifiers.update(|m| {
            let mut m = *m;
            m.key_down(key);
            m
        });
    }

    pub fn key_up(&self, key: &str) {
        self.modifiers.update(|m| {
            let mut m = *m;
            m.key_up(key);
            m
        });
    }

    pub fn modifiers(&self) -> Modifiers {
        *self.modifiers.get()
    }

    /// Handles a click on entry `index` of column `column`.
    ///
    /// Shift extends the selection from the last clicked entry in the same
    /// column. Ctrl toggles the entry. A plain click selects only the entry
    /// and opens it as the next column.
    ///
    /// # Errors
    ///
    /// [`CoreError::IndexOutOfRange`] if the column or entry does not exist
    /// in the current snapshot, or whatever opening the entry reports.
    pub async fn click_entry(&self, column: usize, index: usize) -> CoreResult<()> {
        let stack = self.snapshot();
        let dir = stack.entries().get(column).ok_or(CoreError::IndexOutOfRange {
            index: column,
            len: stack.entries().len(),
        })?;
        let listing = dir.children();
        let entry = listing.get(index).ok_or(CoreError::IndexOutOfRange {
            index,
            len: listing.len(),
        })?;
        let modifiers = self.modifiers();

        if modifiers.shift() {
            let anchor = (*self.anchor.get())
                .filter(|a| a.column == column)
                .map(|a| a.index);
            let paths: Vec<&str> = listing.iter().map(DirectoryEntry::path).collect();
            self.selection
                .update(|s| s.clone().select_range(anchor, index, &paths));
            return Ok(());
        }

        self.anchor.set(Some(Anchor { column, index }));
        self.selection
            .update(|s| s.clone().apply_click(entry.path(), modifiers));
        if modifiers.ctrl() {
            return Ok(());
        }

        let depth = stack
            .cumulative_paths()
            .iter()
            .position(|p| p == dir.path())
            .ok_or_else(|| CoreError::NotFound(dir.path().to_string()))?;
        self.manager.open(entry.name(), depth + 1).await
    }

    /// Background click: drops the selection and closes any dropdown.
    pub fn clear_selection(&self) {
        self.selection.set(SelectionSet::default());
        self.anchor.set(None);
        menu::hide_dropdown(&self.dropdown);
    }

    /// A double-click discriminator using the configured window.
    pub fn click_tracker(&self) -> ClickTracker {
        ClickTracker::new(self.config.input.double_click_window())
    }

    // Context menus

    pub fn dropdown(&self) -> Arc<DropdownState> {
        self.dropdown.get()
    }

    pub fn subscribe_dropdown(&self) -> watch::Receiver<Arc<DropdownState>> {
        self.dropdown.subscribe()
    }

    /// Shows the entry menu for `entry_path`.
    ///
    /// "Rename" runs `on_rename` so the frontend can start inline editing;
    /// "Move to recycle" submits [`Command::Trash`].
    pub fn show_entry_menu(
        &self,
        x: f64,
        y: f64,
        entry_path: &str,
        on_rename: impl Fn() + Send + Sync + 'static,
    ) {
        let commands = self.commands.clone();
        let doomed = entry_path.to_string();
        let options = menu::entry_menu(&self.dropdown, on_rename, move || {
            if commands.send(Command::Trash(doomed.clone())).is_err() {
                warn!(doomed = %doomed, "command worker stopped, dropping trash");
            }
        });
        menu::show_dropdown(&self.dropdown, x, y, options);
    }

    /// Shows the column menu. "New Folder" runs `on_new_folder`; the
    /// frontend submits [`Command::Mkdir`] once a name is entered.
    pub fn show_column_menu(&self, x: f64, y: f64, on_new_folder: impl Fn() + Send + Sync + 'static) {
        let options = menu::column_menu(&self.dropdown, on_new_folder);
        menu::show_dropdown(&self.dropdown, x, y, options);
    }

    pub fn hide_dropdown(&self) {
        menu::hide_dropdown(&self.dropdown);
    }

    // Rendering helpers

    /// The svg for `entry`; opened directories get the open-folder icon.
    pub async fn icon_for(&self, entry: &DirectoryEntry) -> CoreResult<Arc<str>> {
        let highlighted = entry.is_dir()
            && self
                .snapshot()
                .cumulative_paths()
                .iter()
                .any(|p| p == entry.path());
        let name = icon_name_for(entry, highlighted, &self.associations);
        self.icons.get(&name).await
    }

    /// A text preview of the file at `file`.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotPreviewable`] unless the file's associated type is
    /// plain text and its content is not binary.
    pub async fn preview(&self, file: &str) -> CoreResult<TextPreview> {
        let ext = associations::extension_of(path::last_path_fragment(file));
        if !self.associations.is_text(ext) {
            let kind = self.associations.type_of(ext);
            return Err(CoreError::NotPreviewable(format!("{file} is {kind}")));
        }
        read_text_preview(self.manager.gateway().as_ref(), file, self.config.preview.max_lines).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.worker.abort();
        if let Some(listener) = self.listener.get_mut().take() {
            listener.abort();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("stack", &self.snapshot())
            .field("selection", &self.selection.get())
            .finish_non_exhaustive()
    }
}

/// Runs each submitted command on its own task and forwards its outcome.
fn spawn_command_worker(
    manager: Arc<StackManager<dyn FsGateway>>,
    mut commands: UnboundedReceiver<Command>,
    events: UnboundedSender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            let manager = Arc::clone(&manager);
            let events = events.clone();
            tokio::spawn(async move {
                let event = manager.dispatch(command).await;
                if let Event::OperationFailed { operation, error, .. } = &event {
                    warn!(operation = %operation, error = %error, "command failed");
                }
                // The frontend may have stopped listening; that is not an error.
                let _ = events.send(event);
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::EntryKind;
    use crate::fs::gateway::ChangeEvent;
    use crate::nav::testing::MemoryFs;
    use async_trait::async_trait;
    use std::time::Duration;

    struct NamedIcons;

    #[async_trait]
    impl IconSource for NamedIcons {
        async fn get_icon(&self, name: &str) -> CoreResult<String> {
            match name {
                "folder.default" | "folder.default.open" | "file.default" | "file.markdown" => {
                    Ok(format!("<svg>{name}</svg>"))
                }
                _ => Err(CoreError::NotFound(name.to_string())),
            }
        }
    }

    fn tree() -> Arc<MemoryFs> {
        let fs = MemoryFs::with_tree(&[
            "base/",
            "base/alpha/",
            "base/dir/",
            "base/dir/inner.txt",
            "base/beta.txt",
            "base/gamma.txt",
            "other/",
        ]);
        fs.add_file("base/notes.md", b"# title\nbody\n");
        fs
    }

    async fn session(fs: &Arc<MemoryFs>) -> (Session, UnboundedReceiver<Event>) {
        let mut config = Config::default();
        config.general.base_dir = "base".into();
        config.preview.max_lines = 1;
        let associations = Associations::default()
            .with_extension("md", "file.markdown")
            .with_type("md", associations::TEXT_TYPE)
            .with_type("dat", associations::TEXT_TYPE)
            .with_type("png", "file.image");
        let gateway: Arc<dyn FsGateway> = Arc::clone(fs) as Arc<dyn FsGateway>;
        Session::open(gateway, Arc::new(NamedIcons), associations, config)
            .await
            .unwrap()
    }

    fn names(entries: &[DirectoryEntry]) -> Vec<&str> {
        entries.iter().map(DirectoryEntry::name).collect()
    }

    async fn next_event(events: &mut UnboundedReceiver<Event>) -> Event {
        tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("event should arrive")
            .expect("worker should be running")
    }

    #[tokio::test]
    async fn open_resolves_base() {
        let fs = tree();
        let (session, _events) = session(&fs).await;
        let stack = session.snapshot();
        assert_eq!(stack.opened(), ["base"]);
        assert_eq!(
            names(stack.entries()[0].children()),
            ["alpha", "dir", "beta.txt", "gamma.txt", "notes.md"]
        );
    }

    #[tokio::test]
    async fn submitted_commands_report_events() {
        let fs = tree();
        let (session, mut events) = session(&fs).await;

        session.submit(Command::Mkdir("base/fresh".into()));
        assert_eq!(
            next_event(&mut events).await,
            Event::OperationComplete {
                operation: "create folder base/fresh".into()
            }
        );
        assert!(fs.exists("base/fresh"));

        fs.deny("base/beta.txt");
        session.submit(Command::Rename {
            from: "base/beta.txt".into(),
            to: "base/b.txt".into(),
        });
        assert!(next_event(&mut events).await.is_blocking());
    }

    #[tokio::test]
    async fn plain_click_selects_and_opens() {
        let fs = tree();
        let (session, _events) = session(&fs).await;

        session.click_entry(0, 1).await.unwrap();

        assert_eq!(*session.selection(), SelectionSet::new().select("base/dir"));
        let stack = session.snapshot();
        assert_eq!(stack.opened(), ["base", "dir"]);
        assert_eq!(names(stack.entries()[1].children()), ["inner.txt"]);
    }

    #[tokio::test]
    async fn ctrl_click_toggles_without_opening() {
        let fs = tree();
        let (session, _events) = session(&fs).await;

        session.click_entry(0, 2).await.unwrap();
        session.key_down("Control");
        session.click_entry(0, 3).await.unwrap();
        session.click_entry(0, 2).await.unwrap();
        session.key_up("Control");

        assert_eq!(*session.selection(), SelectionSet::new().select("base/gamma.txt"));
        assert_eq!(session.snapshot().opened(), ["base", "beta.txt"]);
    }

    #[tokio::test]
    async fn shift_click_selects_range_from_anchor() {
        let fs = tree();
        let (session, _events) = session(&fs).await;

        session.click_entry(0, 4).await.unwrap();
        session.key_down("Shift");
        session.click_entry(0, 2).await.unwrap();

        let expected = ["base/beta.txt", "base/gamma.txt", "base/notes.md"]
            .iter()
            .fold(SelectionSet::new(), |s, p| s.select(*p));
        assert_eq!(*session.selection(), expected);
    }

    #[tokio::test]
    async fn click_out_of_range_is_rejected() {
        let fs = tree();
        let (session, _events) = session(&fs).await;

        assert!(matches!(
            session.click_entry(3, 0).await,
            Err(CoreError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(matches!(
            session.click_entry(0, 42).await,
            Err(CoreError::IndexOutOfRange { index: 42, .. })
        ));
    }

    #[tokio::test]
    async fn background_click_clears_selection_and_menu() {
        let fs = tree();
        let (session, _events) = session(&fs).await;

        session.click_entry(0, 2).await.unwrap();
        session.show_column_menu(4.0, 2.0, || {});
        session.clear_selection();

        assert!(session.selection().is_empty());
        let dropdown = session.dropdown();
        assert!(!dropdown.is_shown());
        assert_eq!(dropdown.position(), (4.0, 2.0));
    }

    #[tokio::test]
    async fn entry_menu_trashes_through_worker() {
        let fs = tree();
        let (session, mut events) = session(&fs).await;

        session.show_entry_menu(1.0, 2.0, "base/gamma.txt", || {});
        let dropdown = session.dropdown();
        assert!(dropdown.is_shown());
        dropdown.option("Move to recycle").unwrap().execute();

        assert!(!session.dropdown().is_shown());
        assert_eq!(
            next_event(&mut events).await,
            Event::OperationComplete {
                operation: "move base/gamma.txt to trash".into()
            }
        );
        assert!(!fs.exists("base/gamma.txt"));
        assert!(!names(session.snapshot().entries()[0].children()).contains(&"gamma.txt"));
    }

    #[tokio::test]
    async fn icons_follow_open_state_and_associations() {
        let fs = tree();
        let (session, _events) = session(&fs).await;
        session.click_entry(0, 1).await.unwrap();

        let dir = DirectoryEntry::new("base/dir", EntryKind::Directory);
        let alpha = DirectoryEntry::new("base/alpha", EntryKind::Directory);
        let notes = DirectoryEntry::new("base/notes.md", EntryKind::File);
        let rust = DirectoryEntry::new("base/main.rs", EntryKind::File);

        assert_eq!(&*session.icon_for(&dir).await.unwrap(), "<svg>folder.default.open</svg>");
        assert_eq!(&*session.icon_for(&alpha).await.unwrap(), "<svg>folder.default</svg>");
        assert_eq!(&*session.icon_for(&notes).await.unwrap(), "<svg>file.markdown</svg>");
        assert_eq!(&*session.icon_for(&rust).await.unwrap(), "<svg>file.default</svg>");
    }

    #[tokio::test]
    async fn preview_uses_configured_line_cap() {
        let fs = tree();
        let (session, _events) = session(&fs).await;

        let preview = session.preview("base/notes.md").await.unwrap();
        assert_eq!(preview.lines, ["# title"]);
        assert!(preview.is_truncated);
    }

    #[tokio::test]
    async fn preview_refuses_non_text_types() {
        let fs = tree();
        fs.add_file("base/photo.png", b"plain enough");
        fs.add_file("base/blob.bin", b"also plain");
        fs.add_file("base/Makefile", b"all:\n");
        let (session, _events) = session(&fs).await;

        for file in ["base/photo.png", "base/blob.bin", "base/Makefile"] {
            assert!(
                matches!(session.preview(file).await, Err(CoreError::NotPreviewable(_))),
                "{file} should not be previewed"
            );
        }
    }

    #[tokio::test]
    async fn preview_refuses_binary_content_of_text_type() {
        let fs = tree();
        fs.add_file("base/raw.dat", b"head\0tail");
        let (session, _events) = session(&fs).await;

        assert!(matches!(
            session.preview("base/raw.dat").await,
            Err(CoreError::NotPreviewable(_))
        ));
    }

    #[tokio::test]
    async fn set_base_resets_selection_and_watches_new_base() {
        let fs = tree();
        let (session, _events) = session(&fs).await;
        session.click_entry(0, 2).await.unwrap();

        session.set_base("other").await.unwrap();
        assert!(session.selection().is_empty());
        assert_eq!(session.snapshot().opened(), ["other"]);

        let mut rx = session.subscribe();
        rx.borrow_and_update();
        fs.add_dir("other/external");
        fs.emit(ChangeEvent::rename("other/external"));

        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("reload should publish")
            .unwrap();
        assert_eq!(
            names(rx.borrow().entries()[0].children()),
            ["external"]
        );
    }

    #[tokio::test]
    async fn click_tracker_uses_configured_window() {
        let fs = tree();
        let (session, _events) = session(&fs).await;
        let mut tracker = session.click_tracker();
        let start = std::time::Instant::now();
        tracker.click(start);
        assert_eq!(tracker.deadline(), Some(start + Duration::from_millis(300)));
    }
}
