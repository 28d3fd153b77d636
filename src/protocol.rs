//! Wire types exchanged with the run/check service

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lab::LabOutput;

/// A file sent with a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub basename: String,
    pub contents: String,
}

impl Resource {
    pub fn new(basename: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            contents: contents.into(),
        }
    }
}

/// Builder and compiler switches of a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switches {
    #[serde(rename = "Builder", default)]
    pub builder: Vec<String>,
    #[serde(rename = "Compiler", default)]
    pub compiler: Vec<String>,
}

impl Switches {
    /// Parse the switch set stored with a widget description.
    /// An empty string means no switches at all.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }
}

/// Job submitted to `run_program`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionJob {
    pub files: Vec<Resource>,
    pub main: String,
    pub mode: String,
    pub switches: Switches,
    pub name: String,
    pub lab: bool,
}

/// Response of `run_program`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub message: String,
}

/// Request body of `check_output`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollRequest {
    pub identifier: String,
    /// Number of messages already received for this job
    pub read: usize,
}

/// Kind of an output message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Console,
    Stdout,
    Stderr,
    InternalError,
    Lab,
    Unknown(String),
}

impl MessageKind {
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "console" => MessageKind::Console,
            "stdout" => MessageKind::Stdout,
            "stderr" => MessageKind::Stderr,
            "internal_error" => MessageKind::InternalError,
            "lab" => MessageKind::Lab,
            other => MessageKind::Unknown(other.to_string()),
        }
    }
}

/// One message of an output packet, as sent by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl RawMessage {
    pub fn text(kind: &str, data: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            data: Value::String(data.into()),
        }
    }

    pub fn message_kind(&self) -> MessageKind {
        MessageKind::from_type(&self.kind)
    }

    /// Free-text payload; structured payloads are rendered as JSON
    pub fn data_text(&self) -> String {
        match &self.data {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Structured payload of a `lab` message
    pub fn lab_output(&self) -> serde_json::Result<LabOutput> {
        serde_json::from_value(self.data.clone())
    }
}

/// Response of `check_output`: the next slice of job output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputPacket {
    #[serde(rename = "output", default)]
    pub messages: Vec<RawMessage>,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "status", default)]
    pub exit_status: Option<i32>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub test_ref: Option<String>,
}

impl OutputPacket {
    /// Non-zero exit status of a terminal packet
    pub fn failed_status(&self) -> Option<i32> {
        match (self.completed, self.exit_status) {
            (true, Some(status)) if status != 0 => Some(status),
            _ => None,
        }
    }
}
