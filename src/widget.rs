//! Code widget
//!
//! A widget owns the editors of one code block, its console, and (for labs)
//! the per-test output areas. It builds jobs from the current editor
//! contents and routes every output packet of a run:
//! - `console` messages go to the home area verbatim
//! - `stdout`/`stderr`/`internal_error` are classified line by line and
//!   linked back to the editors when the file is open
//! - `lab` results update the lab container and the console status line
//!
//! Same-named widgets on a page share files: each one starts from a copy of
//! the previous widget's view registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::areas::{LabContainer, OutputArea, OutputSink};
use crate::diagnostic::classify_output;
use crate::editor::{Editor, TabBar};
use crate::error::{Result, WidgetError};
use crate::preferences::{PreferenceStore, Preferences};
use crate::protocol::{ExecutionJob, MessageKind, OutputPacket, RawMessage, Resource, Switches};
use crate::session::Session;
use crate::strings::{
    CONSOLE_OUTPUT_LABEL, EXIT_STATUS_LABEL, INTERNAL_ERROR_MESSAGE, MACHINE_BUSY_LABEL,
    WIDGET_ERROR_NOTICE,
};
use crate::switches::{builtin_catalog, SwitchPanel};
use crate::transport::Transport;
use crate::view::{resolve, EditorView, ViewRegistry};

/// Declarative description of a widget, as embedded in the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetSpec {
    pub id: String,
    pub name: String,
    pub main: String,
    /// Base address of the run/check service
    pub server: String,
    #[serde(default)]
    pub lab: bool,
    #[serde(default)]
    pub switches: Switches,
    #[serde(default)]
    pub files: Vec<Resource>,
    /// Files sent with every job but never shown
    #[serde(default)]
    pub shadow_files: Vec<Resource>,
    /// Read-only blocks displayed next to the output
    #[serde(default)]
    pub code_block_info: Vec<Resource>,
}

/// Host-provided collaborators of one widget
pub struct Surface<S: OutputSink = OutputArea> {
    pub editor: Arc<dyn Editor>,
    pub tabs: Arc<dyn TabBar>,
    pub console: S,
}

impl<S: OutputSink> Surface<S> {
    pub fn new(editor: Arc<dyn Editor>, tabs: Arc<dyn TabBar>, console: S) -> Self {
        Self {
            editor,
            tabs,
            console,
        }
    }
}

/// Plain widgets route everything to the console; lab widgets route packets
/// carrying a test reference to that test's area.
#[derive(Debug)]
pub enum Mode {
    Plain,
    Lab(LabContainer),
}

impl Mode {
    fn for_spec(spec: &WidgetSpec) -> Self {
        if spec.lab {
            Mode::Lab(LabContainer::new())
        } else {
            Mode::Plain
        }
    }

    pub fn is_lab(&self) -> bool {
        matches!(self, Mode::Lab(_))
    }

    /// Area receiving the messages of a packet
    pub fn home_area<'a>(
        &'a mut self,
        test_ref: Option<&str>,
        console: &'a mut dyn OutputSink,
    ) -> Result<&'a mut dyn OutputSink> {
        match (self, test_ref) {
            (_, None) => Ok(console),
            (Mode::Lab(labs), Some(test_ref)) => Ok(labs.lab_area(test_ref)),
            (Mode::Plain, Some(test_ref)) => Err(WidgetError::MalformedPacket(format!(
                "has ref {} in non-lab",
                test_ref
            ))),
        }
    }

    /// Handle a mode-specific message. Returns false when the message is
    /// not special for this mode.
    pub fn handle_special_message(
        &mut self,
        msg: &RawMessage,
        console: &mut dyn OutputSink,
    ) -> Result<bool> {
        let Mode::Lab(labs) = self else {
            return Ok(false);
        };
        if msg.message_kind() != MessageKind::Lab {
            return Ok(false);
        }

        let output = msg
            .lab_output()
            .map_err(|e| WidgetError::MalformedPacket(format!("invalid lab payload: {}", e)))?;
        let status = labs.process_results(&output);
        debug!(
            "Lab status: passed={}/{}, any_failed={}",
            status.passed, status.total, status.any_failed
        );
        console.add_lab_status(&status);
        Ok(true)
    }

    fn reset(&mut self) {
        if let Mode::Lab(labs) = self {
            labs.reset();
        }
    }
}

pub struct Widget<S: OutputSink = OutputArea> {
    id: String,
    name: String,
    main: String,
    server: String,
    switches: Switches,
    views: ViewRegistry,
    shadow_files: Vec<Resource>,
    code_block_info: Vec<Resource>,
    editor: Arc<dyn Editor>,
    console: S,
    mode: Mode,
    panel: SwitchPanel,
    prefs: Preferences,
}

impl<S: OutputSink> Widget<S> {
    /// Build a widget from its description.
    ///
    /// `dep` is the view registry of the previous widget with the same name,
    /// if any; its entries are copied before this widget's own files are
    /// registered over them.
    pub fn new(
        spec: WidgetSpec,
        dep: Option<&ViewRegistry>,
        surface: Surface<S>,
        prefs: Preferences,
    ) -> Result<Self> {
        let mut views = ViewRegistry::new();
        if let Some(dep) = dep {
            views.overlay(dep);
        }

        let Some(first) = spec.files.first() else {
            return Err(WidgetError::Malformed("No files present.".to_string()));
        };
        let first = first.basename.clone();

        let mode = Mode::for_spec(&spec);
        let catalog = builtin_catalog().map_err(|e| WidgetError::Malformed(format!("{:#}", e)))?;
        let panel = SwitchPanel::new(catalog, &spec.switches);

        let view = EditorView::new(surface.tabs.clone(), surface.editor.clone());
        for file in &spec.files {
            surface.editor.add_session(&file.basename, &file.contents);
            views.insert(file.basename.clone(), view.clone());
        }

        surface.tabs.activate(&first);
        surface.editor.set_session(&first);

        let mut widget = Self {
            id: spec.id,
            name: spec.name,
            main: spec.main,
            server: spec.server,
            switches: spec.switches,
            views,
            shadow_files: spec.shadow_files,
            code_block_info: spec.code_block_info,
            editor: surface.editor,
            console: surface.console,
            mode,
            panel,
            prefs,
        };
        widget.apply_preferences();

        info!(
            "Widget {} ({}) ready: files={}, views={}, lab={}",
            widget.id,
            widget.name,
            spec.files.len(),
            widget.views.len(),
            widget.mode.is_lab()
        );
        Ok(widget)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn is_lab(&self) -> bool {
        self.mode.is_lab()
    }

    /// Registry handed to the next widget with the same name
    pub fn view_registry(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn console(&self) -> &S {
        &self.console
    }

    pub fn lab(&self) -> Option<&LabContainer> {
        match &self.mode {
            Mode::Lab(labs) => Some(labs),
            Mode::Plain => None,
        }
    }

    pub fn code_block_info(&self) -> &[Resource] {
        &self.code_block_info
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    pub fn switches(&self) -> &SwitchPanel {
        &self.panel
    }

    /// Toggle a compiler switch as the settings bar would
    pub fn set_switch(&mut self, name: &str, checked: bool) -> bool {
        self.panel.set(name, checked)
    }

    /// Current content of every registered file, then the shadow files
    pub fn collect_resources(&self) -> Vec<Resource> {
        self.views
            .iter()
            .map(|(basename, view)| {
                Resource::new(basename, view.editor.get_session_content(basename))
            })
            .chain(self.shadow_files.iter().cloned())
            .collect()
    }

    pub fn build_job(&self, mode: &str) -> ExecutionJob {
        ExecutionJob {
            files: self.collect_resources(),
            main: self.main.clone(),
            mode: mode.to_string(),
            switches: Switches {
                builder: self.switches.builder.clone(),
                compiler: self.panel.active(),
            },
            name: self.name.clone(),
            lab: self.mode.is_lab(),
        }
    }

    /// Button callback: run the current files in `mode`.
    ///
    /// A busy service is reported in the console and is not an error;
    /// protocol violations are returned after being displayed.
    pub async fn run<T: Transport>(&mut self, mode: &str, session: &mut Session<T>) -> Result<()> {
        self.console.reset();
        self.mode.reset();
        for (_, view) in self.views.iter() {
            view.editor.clear_gutter_annotation();
        }

        self.console
            .add_heading(&format!("{}:", CONSOLE_OUTPUT_LABEL));
        self.console.show_spinner(true);

        let job = self.build_job(mode);
        let result = session
            .execute(&job, |packet| self.process_packet(packet))
            .await;

        let result = match result {
            Err(e) if e.is_busy() => {
                self.console.add_error(MACHINE_BUSY_LABEL);
                error!("Widget {}: {}", self.id, e);
                Ok(())
            }
            other => other,
        };
        self.console.show_spinner(false);

        if let Mode::Lab(labs) = &mut self.mode {
            labs.sort();
        }
        result
    }

    /// Route one packet. Returns whether it was the last one.
    pub fn process_packet(&mut self, packet: &OutputPacket) -> Result<bool> {
        let test_ref = packet.test_ref.as_deref();
        // Rejects a ref in plain mode and opens the lab area even when the
        // packet has no messages for it.
        self.mode.home_area(test_ref, &mut self.console)?;

        for msg in &packet.messages {
            self.handle_message(test_ref, msg)?;
        }

        if let Some(status) = packet.failed_status() {
            self.console
                .add_error(&format!("{}: {}", EXIT_STATUS_LABEL, status));
        }

        Ok(packet.completed)
    }

    fn handle_message(&mut self, test_ref: Option<&str>, msg: &RawMessage) -> Result<()> {
        if self.mode.handle_special_message(msg, &mut self.console)? {
            return Ok(());
        }

        let home = self.mode.home_area(test_ref, &mut self.console)?;
        match msg.message_kind() {
            MessageKind::Console => home.add_console(&msg.data_text()),
            kind @ (MessageKind::Stdout | MessageKind::Stderr | MessageKind::InternalError) => {
                let internal = kind == MessageKind::InternalError;
                for diagnostic in classify_output(&msg.data_text(), internal) {
                    resolve(&diagnostic, &self.views).deliver(home);
                }
            }
            MessageKind::Lab | MessageKind::Unknown(_) => {
                home.add_line(&msg.data_text());
                warn!("Widget {}: unhandled message type {}", self.id, msg.kind);
                return Err(WidgetError::UnhandledMessage(msg.kind.clone()));
            }
        }
        Ok(())
    }

    /// Settings bar reset: restore the editors, clear output, restore switches
    pub fn reset_editors(&mut self) {
        self.console.reset();
        for (_, view) in self.views.iter() {
            view.editor.reset();
        }
        self.mode.reset();
        self.panel.reset(&self.switches);
    }

    /// Persist new preferences and apply them to this widget
    pub fn update_preferences(
        &mut self,
        prefs: Preferences,
        store: &mut dyn PreferenceStore,
    ) -> Result<()> {
        store
            .save(&prefs)
            .map_err(|e| WidgetError::Preferences(format!("{:#}", e)))?;
        self.prefs = prefs;
        self.apply_preferences();
        Ok(())
    }

    fn apply_preferences(&mut self) {
        self.editor.refresh(self.prefs.tabbed_view);
        for (_, view) in self.views.iter() {
            view.editor.set_theme(self.prefs.theme);
        }
    }
}

/// Result of building one widget of a page
pub enum WidgetSlot<S: OutputSink = OutputArea> {
    Ready(Widget<S>),
    /// The widget could not be built; its region shows `notice` instead
    Failed { id: String, notice: String },
}

impl<S: OutputSink> WidgetSlot<S> {
    pub fn widget(&self) -> Option<&Widget<S>> {
        match self {
            WidgetSlot::Ready(widget) => Some(widget),
            WidgetSlot::Failed { .. } => None,
        }
    }

    pub fn widget_mut(&mut self) -> Option<&mut Widget<S>> {
        match self {
            WidgetSlot::Ready(widget) => Some(widget),
            WidgetSlot::Failed { .. } => None,
        }
    }
}

/// Build every widget of a page in declaration order.
///
/// A widget inherits the view registry of the last successfully built widget
/// with the same name. A failing widget is replaced by an error notice and
/// does not affect the others.
pub fn build_widgets<S: OutputSink>(
    entries: Vec<(WidgetSpec, Surface<S>)>,
    prefs: Preferences,
) -> Vec<WidgetSlot<S>> {
    let mut registries: HashMap<String, ViewRegistry> = HashMap::new();
    let mut slots = Vec::with_capacity(entries.len());

    for (spec, surface) in entries {
        let id = spec.id.clone();
        let name = spec.name.clone();

        match Widget::new(spec, registries.get(&name), surface, prefs) {
            Ok(widget) => {
                registries.insert(name, widget.view_registry().clone());
                slots.push(WidgetSlot::Ready(widget));
            }
            Err(e) => {
                error!("Failed to build widget {}: {}", id, e);
                slots.push(WidgetSlot::Failed {
                    id,
                    notice: format!("{} {}", WIDGET_ERROR_NOTICE, INTERNAL_ERROR_MESSAGE),
                });
            }
        }
    }

    info!("Built {} widgets", slots.len());
    slots
}
