//! View registry and diagnostic resolution
//!
//! Every widget keeps a registry of the files it can show, keyed by basename.
//! Widgets sharing a name on a page inherit the registry of the previous one
//! (copied by value) and then add or override their own files, so a
//! diagnostic about a file from an earlier widget still jumps to that widget.

use std::fmt;
use std::sync::Arc;

use crate::areas::OutputSink;
use crate::diagnostic::{Diagnostic, Severity};
use crate::editor::{Editor, TabBar};

/// The tab header and editor showing one file
#[derive(Clone)]
pub struct EditorView {
    pub tabs: Arc<dyn TabBar>,
    pub editor: Arc<dyn Editor>,
}

impl EditorView {
    pub fn new(tabs: Arc<dyn TabBar>, editor: Arc<dyn Editor>) -> Self {
        Self { tabs, editor }
    }
}

impl fmt::Debug for EditorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorView").finish_non_exhaustive()
    }
}

/// Insertion-ordered `basename -> EditorView` map.
///
/// Overriding an existing basename replaces the view in place, keeping the
/// position of the first insertion.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    entries: Vec<(String, EditorView)>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, basename: impl Into<String>, view: EditorView) {
        let basename = basename.into();
        match self.entries.iter_mut().find(|(name, _)| *name == basename) {
            Some(entry) => entry.1 = view,
            None => self.entries.push((basename, view)),
        }
    }

    /// Copy every entry of `other` into this registry, overriding on conflict
    pub fn overlay(&mut self, other: &ViewRegistry) {
        for (basename, view) in other.iter() {
            self.insert(basename, view.clone());
        }
    }

    pub fn get(&self, basename: &str) -> Option<&EditorView> {
        self.entries
            .iter()
            .find(|(name, _)| name == basename)
            .map(|(_, view)| view)
    }

    pub fn contains(&self, basename: &str) -> bool {
        self.get(basename).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EditorView)> {
        self.entries.iter().map(|(name, view)| (name.as_str(), view))
    }

    pub fn basenames(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Navigation bound to a clickable message
#[derive(Debug, Clone)]
pub struct ClickAction {
    pub basename: String,
    pub row: u32,
    pub column: u32,
    view: EditorView,
}

impl ClickAction {
    pub fn new(basename: impl Into<String>, row: u32, column: u32, view: EditorView) -> Self {
        Self {
            basename: basename.into(),
            row,
            column,
            view,
        }
    }

    /// Jump to the location. Ignored while the user has text selected, so
    /// selecting output to copy it does not move the editor.
    pub fn on_click(&self, selection: &str) -> bool {
        if !selection.is_empty() {
            return false;
        }
        self.view.tabs.scroll_into_view(&self.basename);
        self.view.tabs.activate(&self.basename);
        self.view.editor.set_session(&self.basename);
        self.view
            .editor
            .goto_line(&self.basename, self.row, self.column);
        true
    }

    fn annotate(&self, text: &str, severity: &str) {
        self.view
            .editor
            .set_gutter_annotation(&self.basename, self.row, self.column, text, severity);
    }
}

/// A diagnostic after view resolution
#[derive(Debug, Clone)]
pub enum ResolvedMessage {
    /// Not clickable: no location, or the file is not open anywhere
    Plain(String),
    Info {
        text: String,
        severity: String,
        action: ClickAction,
    },
    Message {
        text: String,
        severity: String,
        action: ClickAction,
    },
}

impl ResolvedMessage {
    pub fn text(&self) -> &str {
        match self {
            ResolvedMessage::Plain(text)
            | ResolvedMessage::Info { text, .. }
            | ResolvedMessage::Message { text, .. } => text,
        }
    }

    pub fn action(&self) -> Option<&ClickAction> {
        match self {
            ResolvedMessage::Plain(_) => None,
            ResolvedMessage::Info { action, .. } | ResolvedMessage::Message { action, .. } => {
                Some(action)
            }
        }
    }

    /// Annotate the editor gutter (clickable messages only) and render into `sink`
    pub fn deliver(self, sink: &mut dyn OutputSink) {
        match self {
            ResolvedMessage::Plain(text) => sink.add_line(&text),
            ResolvedMessage::Info {
                text,
                severity,
                action,
            } => {
                action.annotate(&text, &severity);
                sink.add_info(&text, action);
            }
            ResolvedMessage::Message {
                text,
                severity,
                action,
            } => {
                action.annotate(&text, &severity);
                sink.add_msg(&text, action);
            }
        }
    }
}

/// Associate a diagnostic with the view showing its file
pub fn resolve(diagnostic: &Diagnostic, views: &ViewRegistry) -> ResolvedMessage {
    let text = diagnostic.raw_text.clone();

    let Some(location) = &diagnostic.location else {
        return ResolvedMessage::Plain(text);
    };
    let Some(view) = views.get(&location.file) else {
        return ResolvedMessage::Plain(text);
    };

    let action = ClickAction::new(
        location.file.clone(),
        location.row,
        location.column,
        view.clone(),
    );
    let severity = diagnostic.label().to_string();

    match diagnostic.severity {
        Severity::Info => ResolvedMessage::Info {
            text,
            severity,
            action,
        },
        _ => ResolvedMessage::Message {
            text,
            severity,
            action,
        },
    }
}
