//! Error types shared by the widget, the session and the stores

use thiserror::Error;

/// Errors surfaced by the widget core
#[derive(Debug, Error)]
pub enum WidgetError {
    /// Widget description cannot be turned into a widget (e.g. no files)
    #[error("Malformed widget: {0}")]
    Malformed(String),

    /// Packet shape does not fit the widget mode
    #[error("Malformed data packet: {0}")]
    MalformedPacket(String),

    /// Output message type unknown to this client (protocol drift)
    #[error("Unhandled msg type: {0}")]
    UnhandledMessage(String),

    /// Submission or polling failed; the service is treated as busy
    #[error("Machine busy: {0}")]
    Busy(String),

    /// Preference store failure
    #[error("Preferences: {0}")]
    Preferences(String),
}

impl WidgetError {
    /// Busy error from a transport failure, keeping the whole context chain
    pub fn busy(err: &anyhow::Error) -> Self {
        WidgetError::Busy(format!("{:#}", err))
    }

    /// Whether the failure is recoverable by simply retrying later
    pub fn is_busy(&self) -> bool {
        matches!(self, WidgetError::Busy(_))
    }
}

pub type Result<T> = std::result::Result<T, WidgetError>;
