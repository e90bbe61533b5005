//! Context menu state.
//!
//! A [`DropdownState`] lives in a [`Store`] owned by the session. Showing a
//! dropdown replaces the whole state; hiding it only clears the visibility
//! flag so the closing menu keeps its last position and options.

use std::fmt;
use std::sync::Arc;

use crate::store::Store;

/// Callback run when a menu option is chosen.
pub type MenuAction = Arc<dyn Fn() + Send + Sync>;

/// One labelled entry of a context menu.
#[derive(Clone)]
pub struct MenuOption {
    name: String,
    execute: MenuAction,
}

impl MenuOption {
    pub fn new(name: impl Into<String>, execute: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            execute: Arc::new(execute),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn execute(&self) {
        (self.execute)();
    }
}

impl fmt::Debug for MenuOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuOption")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DropdownState {
    x: f64,
    y: f64,
    options: Vec<MenuOption>,
    show: bool,
}

impl DropdownState {
    /// A visible dropdown at `(x, y)`.
    pub fn shown(x: f64, y: f64, options: Vec<MenuOption>) -> Self {
        Self {
            x,
            y,
            options,
            show: true,
        }
    }

    /// The same dropdown with only the visibility flag cleared.
    #[must_use]
    pub fn hidden(&self) -> Self {
        Self {
            show: false,
            ..self.clone()
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn options(&self) -> &[MenuOption] {
        &self.options
    }

    pub fn is_shown(&self) -> bool {
        self.show
    }

    /// Looks up an option by label.
    pub fn option(&self, name: &str) -> Option<&MenuOption> {
        self.options.iter().find(|o| o.name == name)
    }
}

pub fn show_dropdown(store: &Store<DropdownState>, x: f64, y: f64, options: Vec<MenuOption>) {
    store.set(DropdownState::shown(x, y, options));
}

pub fn hide_dropdown(store: &Store<DropdownState>) {
    store.update(DropdownState::hidden);
}

/// Wraps `action` so that it closes the dropdown before running.
///
/// The options live inside the dropdown store, so they only hold a weak
/// reference back to it.
fn closing(
    dropdown: &Arc<Store<DropdownState>>,
    action: impl Fn() + Send + Sync + 'static,
) -> impl Fn() + Send + Sync + 'static {
    let dropdown = Arc::downgrade(dropdown);
    move || {
        if let Some(dropdown) = dropdown.upgrade() {
            hide_dropdown(&dropdown);
        }
        action();
    }
}

/// Menu shown when right-clicking an entry.
pub fn entry_menu(
    dropdown: &Arc<Store<DropdownState>>,
    on_rename: impl Fn() + Send + Sync + 'static,
    on_trash: impl Fn() + Send + Sync + 'static,
) -> Vec<MenuOption> {
    vec![
        MenuOption::new("Rename", closing(dropdown, on_rename)),
        MenuOption::new("Move to recycle", closing(dropdown, on_trash)),
    ]
}

/// Menu shown when right-clicking the empty part of a column.
pub fn column_menu(
    dropdown: &Arc<Store<DropdownState>>,
    on_new_folder: impl Fn() + Send + Sync + 'static,
) -> Vec<MenuOption> {
    vec![MenuOption::new("New Folder", closing(dropdown, on_new_folder))]
}
