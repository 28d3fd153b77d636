//! Output areas
//!
//! An [`OutputSink`] is a place classified messages are rendered into. The
//! console is a single linear [`OutputArea`]; lab widgets additionally keep a
//! [`LabContainer`] with one area per lab test. Areas record entries in
//! memory; the page renders them.

use std::collections::BTreeMap;

use crate::lab::{AggregateStatus, LabAggregator, LabOutput, LabTestResult};
use crate::strings::{LAB_COMPLETE_LABEL, LAB_FAILED_LABEL, LAB_PENDING_LABEL};
use crate::view::ClickAction;

/// Rendering surface for classified messages
pub trait OutputSink {
    /// Plain, non-clickable line
    fn add_line(&mut self, text: &str);
    /// Clickable message with error styling
    fn add_msg(&mut self, text: &str, action: ClickAction);
    /// Clickable message with info styling
    fn add_info(&mut self, text: &str, action: ClickAction);
    /// Raw console text from the running program
    fn add_console(&mut self, text: &str);
    fn add_error(&mut self, text: &str);
    fn add_lab_status(&mut self, status: &AggregateStatus);
    fn add_heading(&mut self, text: &str);
    fn show_spinner(&mut self, on: bool);
    fn reset(&mut self);
}

#[derive(Debug, Clone)]
pub enum OutputEntry {
    Line(String),
    Msg { text: String, action: ClickAction },
    Info { text: String, action: ClickAction },
    Console(String),
    Error(String),
    LabStatus(AggregateStatus),
    Heading(String),
}

impl OutputEntry {
    pub fn text(&self) -> String {
        match self {
            OutputEntry::Line(text)
            | OutputEntry::Console(text)
            | OutputEntry::Error(text)
            | OutputEntry::Heading(text)
            | OutputEntry::Msg { text, .. }
            | OutputEntry::Info { text, .. } => text.clone(),
            OutputEntry::LabStatus(status) => lab_status_label(status),
        }
    }

    pub fn action(&self) -> Option<&ClickAction> {
        match self {
            OutputEntry::Msg { action, .. } | OutputEntry::Info { action, .. } => Some(action),
            _ => None,
        }
    }
}

/// Summary line for a lab status
pub fn lab_status_label(status: &AggregateStatus) -> String {
    if status.all_passed {
        LAB_COMPLETE_LABEL.to_string()
    } else if status.any_failed {
        format!(
            "{} ({}/{} passed)",
            LAB_FAILED_LABEL, status.passed, status.total
        )
    } else {
        format!(
            "{} ({}/{} passed, {} pending)",
            LAB_PENDING_LABEL, status.passed, status.total, status.pending
        )
    }
}

/// Linear output area
#[derive(Debug, Clone, Default)]
pub struct OutputArea {
    entries: Vec<OutputEntry>,
    spinner: bool,
}

impl OutputArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[OutputEntry] {
        &self.entries
    }

    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(OutputEntry::text).collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                OutputEntry::Error(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn is_spinning(&self) -> bool {
        self.spinner
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OutputSink for OutputArea {
    fn add_line(&mut self, text: &str) {
        self.entries.push(OutputEntry::Line(text.to_string()));
    }

    fn add_msg(&mut self, text: &str, action: ClickAction) {
        self.entries.push(OutputEntry::Msg {
            text: text.to_string(),
            action,
        });
    }

    fn add_info(&mut self, text: &str, action: ClickAction) {
        self.entries.push(OutputEntry::Info {
            text: text.to_string(),
            action,
        });
    }

    fn add_console(&mut self, text: &str) {
        self.entries.push(OutputEntry::Console(text.to_string()));
    }

    fn add_error(&mut self, text: &str) {
        self.entries.push(OutputEntry::Error(text.to_string()));
    }

    fn add_lab_status(&mut self, status: &AggregateStatus) {
        self.entries.push(OutputEntry::LabStatus(status.clone()));
    }

    fn add_heading(&mut self, text: &str) {
        self.entries.push(OutputEntry::Heading(text.to_string()));
    }

    fn show_spinner(&mut self, on: bool) {
        self.spinner = on;
    }

    fn reset(&mut self) {
        self.entries.clear();
        self.spinner = false;
    }
}

/// Per-test output areas of a lab widget
#[derive(Debug, Default)]
pub struct LabContainer {
    aggregator: LabAggregator,
    areas: BTreeMap<String, OutputArea>,
    order: Vec<String>,
}

impl LabContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Area of a lab test, created (pending) on first reference
    pub fn lab_area(&mut self, test_ref: &str) -> &mut OutputArea {
        self.aggregator.touch(test_ref);
        self.ensure_area(test_ref)
    }

    fn ensure_area(&mut self, test_ref: &str) -> &mut OutputArea {
        if !self.areas.contains_key(test_ref) {
            self.order.push(test_ref.to_string());
        }
        self.areas.entry(test_ref.to_string()).or_default()
    }

    /// Merge lab results and return the updated overall status
    pub fn process_results(&mut self, output: &LabOutput) -> AggregateStatus {
        for result in output.results() {
            self.ensure_area(&result.test_ref);
        }
        self.aggregator.apply(output)
    }

    pub fn status(&self) -> AggregateStatus {
        self.aggregator.status()
    }

    pub fn result(&self, test_ref: &str) -> Option<&LabTestResult> {
        self.aggregator.get(test_ref)
    }

    pub fn area(&self, test_ref: &str) -> Option<&OutputArea> {
        self.areas.get(test_ref)
    }

    /// Order areas for display: failures first, then by reference
    pub fn sort(&mut self) {
        self.order = self
            .aggregator
            .sorted()
            .into_iter()
            .map(|r| r.test_ref.clone())
            .collect();
    }

    /// Test references in display order (arrival order until sorted)
    pub fn display_order(&self) -> &[String] {
        &self.order
    }

    pub fn reset(&mut self) {
        self.aggregator.reset();
        self.areas.clear();
        self.order.clear();
    }
}
