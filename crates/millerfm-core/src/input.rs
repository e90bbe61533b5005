//! Pointer and keyboard gesture state.
//!
//! [`Modifiers`] remembers which selection modifiers are held, and
//! [`ClickTracker`] tells single clicks from double clicks. Both are driven
//! by the UI's raw events and hold no references to the rest of the core.

use std::time::{Duration, Instant};

/// Held selection modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    shift: bool,
    ctrl: bool,
}

impl Modifiers {
    /// Records a key press by its DOM-style key name (`"Shift"`, `"Control"`).
    pub fn key_down(&mut self, key: &str) {
        self.set(key, true);
    }

    pub fn key_up(&mut self, key: &str) {
        self.set(key, false);
    }

    pub fn shift(&self) -> bool {
        self.shift
    }

    pub fn ctrl(&self) -> bool {
        self.ctrl
    }

    fn set(&mut self, key: &str, down: bool) {
        match key {
            "Shift" => self.shift = down,
            "Control" => self.ctrl = down,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    Single,
    Double,
}

/// Distinguishes single from double clicks.
///
/// A first click is held back for the double-click window. A second click
/// inside the window is reported as [`Click::Double`] right away; otherwise
/// [`ClickTracker::poll`] releases the held click as [`Click::Single`] once
/// the window has passed.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    window: Duration,
    pending: Option<Instant>,
}

impl ClickTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Registers a click at `at`.
    ///
    /// Returns `Some(Double)` when it completes a double click. If an
    /// earlier click's window had already passed without being polled, that
    /// click is released as `Some(Single)` and this one is held instead.
    pub fn click(&mut self, at: Instant) -> Option<Click> {
        match self.pending.take() {
            Some(first) if at.saturating_duration_since(first) < self.window => Some(Click::Double),
            Some(_) => {
                self.pending = Some(at);
                Some(Click::Single)
            }
            None => {
                self.pending = Some(at);
                None
            }
        }
    }

    /// Releases the held click as a single click once its window is over.
    pub fn poll(&mut self, now: Instant) -> Option<Click> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.pending = None;
        Some(Click::Single)
    }

    /// When the held click, if any, becomes a single click.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|first| first + self.window)
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}
