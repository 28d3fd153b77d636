//! Editor collaborators
//!
//! The text editor and its tab headers live outside the core. The widget only
//! talks to them through these traits. `MemoryEditor` and `MemoryTabBar` are
//! headless realizations that keep their state in memory.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::preferences::Theme;

/// Text editor holding one session per file
pub trait Editor: Send + Sync {
    fn add_session(&self, basename: &str, content: &str);
    /// Show the session of `basename`
    fn set_session(&self, basename: &str);
    fn get_session_content(&self, basename: &str) -> String;
    fn set_gutter_annotation(&self, basename: &str, row: u32, column: u32, text: &str, severity: &str);
    fn clear_gutter_annotation(&self);
    fn goto_line(&self, basename: &str, row: u32, column: u32);
    fn set_theme(&self, theme: Theme);
    /// Re-layout after switching between tabbed and stacked editors
    fn refresh(&self, tabbed: bool);
    /// Restore every session to its initial content
    fn reset(&self);
}

/// Tab headers of a widget, one per file
pub trait TabBar: Send + Sync {
    fn scroll_into_view(&self, basename: &str);
    fn activate(&self, basename: &str);
}

/// Gutter annotation recorded by [`MemoryEditor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub basename: String,
    pub row: u32,
    pub column: u32,
    pub text: String,
    pub severity: String,
}

#[derive(Debug, Default)]
struct EditorState {
    initial: BTreeMap<String, String>,
    sessions: BTreeMap<String, String>,
    current: Option<String>,
    annotations: Vec<Annotation>,
    cursor: Option<(String, u32, u32)>,
    theme: Theme,
    tabbed: bool,
}

/// In-memory editor
#[derive(Debug, Default)]
pub struct MemoryEditor {
    state: Mutex<EditorState>,
}

impl MemoryEditor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the content of a session, as a user edit would
    pub fn edit(&self, basename: &str, content: &str) {
        self.state()
            .sessions
            .insert(basename.to_string(), content.to_string());
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.state().annotations.clone()
    }

    pub fn cursor(&self) -> Option<(String, u32, u32)> {
        self.state().cursor.clone()
    }

    pub fn current_session(&self) -> Option<String> {
        self.state().current.clone()
    }

    pub fn theme(&self) -> Theme {
        self.state().theme
    }

    pub fn is_tabbed(&self) -> bool {
        self.state().tabbed
    }
}

impl Editor for MemoryEditor {
    fn add_session(&self, basename: &str, content: &str) {
        let mut state = self.state();
        state
            .initial
            .insert(basename.to_string(), content.to_string());
        state
            .sessions
            .insert(basename.to_string(), content.to_string());
    }

    fn set_session(&self, basename: &str) {
        self.state().current = Some(basename.to_string());
    }

    fn get_session_content(&self, basename: &str) -> String {
        self.state()
            .sessions
            .get(basename)
            .cloned()
            .unwrap_or_default()
    }

    fn set_gutter_annotation(&self, basename: &str, row: u32, column: u32, text: &str, severity: &str) {
        self.state().annotations.push(Annotation {
            basename: basename.to_string(),
            row,
            column,
            text: text.to_string(),
            severity: severity.to_string(),
        });
    }

    fn clear_gutter_annotation(&self) {
        self.state().annotations.clear();
    }

    fn goto_line(&self, basename: &str, row: u32, column: u32) {
        let mut state = self.state();
        state.current = Some(basename.to_string());
        state.cursor = Some((basename.to_string(), row, column));
    }

    fn set_theme(&self, theme: Theme) {
        self.state().theme = theme;
    }

    fn refresh(&self, tabbed: bool) {
        self.state().tabbed = tabbed;
    }

    fn reset(&self) {
        let mut state = self.state();
        state.sessions = state.initial.clone();
        state.annotations.clear();
        state.cursor = None;
    }
}

#[derive(Debug, Default)]
struct TabState {
    active: Option<String>,
    scrolled: Vec<String>,
}

/// In-memory tab bar
#[derive(Debug, Default)]
pub struct MemoryTabBar {
    state: Mutex<TabState>,
}

impl MemoryTabBar {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TabState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn active(&self) -> Option<String> {
        self.state().active.clone()
    }

    /// Tabs scrolled into view, oldest first
    pub fn scrolled(&self) -> Vec<String> {
        self.state().scrolled.clone()
    }
}

impl TabBar for MemoryTabBar {
    fn scroll_into_view(&self, basename: &str) {
        self.state().scrolled.push(basename.to_string());
    }

    fn activate(&self, basename: &str) {
        self.state().active = Some(basename.to_string());
    }
}
