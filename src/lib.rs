//! Code widget core
//!
//! Editable code blocks that submit their files to a remote build/run
//! service and map the classified output back onto the editors:
//! - `session`: submit a job and poll its output packets in order
//! - `diagnostic` / `view`: classify output lines and link them to files
//! - `lab`: aggregate per-test lab results into a verdict
//! - `widget`: one code block, its output areas, and the page factory

pub mod areas;
pub mod config;
pub mod diagnostic;
pub mod editor;
pub mod error;
pub mod lab;
pub mod logging;
pub mod preferences;
pub mod protocol;
pub mod session;
pub mod strings;
pub mod switches;
pub mod transport;
pub mod view;
pub mod widget;

// Re-exports
pub use areas::{LabContainer, OutputArea, OutputEntry, OutputSink};
pub use config::ClientConfig;
pub use diagnostic::{classify, Diagnostic, Severity, SourceLocation};
pub use editor::{Editor, MemoryEditor, MemoryTabBar, TabBar};
pub use error::{Result, WidgetError};
pub use lab::{AggregateStatus, LabAggregator, LabOutput, LabTestResult, Outcome};
pub use preferences::{PreferenceStore, Preferences, Theme};
pub use protocol::{ExecutionJob, OutputPacket, PollRequest, RawMessage, Resource, SubmitResponse, Switches};
pub use session::{Session, SessionState};
pub use transport::{HttpTransport, RedisTransport, Transport};
pub use view::{resolve, ClickAction, EditorView, ResolvedMessage, ViewRegistry};
pub use widget::{build_widgets, Mode, Surface, Widget, WidgetSlot, WidgetSpec};
