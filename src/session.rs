//! Remote execution session
//!
//! Owns one request/response cycle with the run/check service: submit the
//! job, then poll for output packets until one is reported complete. Each
//! packet is handed to the caller as soon as it arrives, strictly in order.
//!
//! States: `Idle -> Submitted -> Polling -> Completed | Failed | Busy`. The
//! terminal state is kept until the next `execute`, which starts from `Idle`.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{Result, WidgetError};
use crate::protocol::{ExecutionJob, OutputPacket, PollRequest};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitted,
    Polling,
    Completed,
    /// The packet handler rejected a packet
    Failed,
    /// Submission or polling failed
    Busy,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Busy
        )
    }
}

pub struct Session<T: Transport> {
    transport: T,
    poll_interval: Duration,
    state: SessionState,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            poll_interval: config.poll_interval,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run `job` to completion.
    ///
    /// `on_packet` is called once per packet and returns whether that packet
    /// was the last one. Transport failures end the session as busy without
    /// retrying; an error from `on_packet` ends it as failed and is returned.
    pub async fn execute<F>(&mut self, job: &ExecutionJob, mut on_packet: F) -> Result<()>
    where
        F: FnMut(&OutputPacket) -> Result<bool>,
    {
        if matches!(self.state, SessionState::Submitted | SessionState::Polling) {
            warn!("Previous job was abandoned mid-flight");
        }
        self.state = SessionState::Idle;

        self.state = SessionState::Submitted;
        let response = match self.transport.submit(job).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to submit job {}: {:#}", job.name, e);
                self.state = SessionState::Busy;
                return Err(WidgetError::busy(&e));
            }
        };

        if response.identifier.is_empty() {
            warn!("Service refused job {}: {}", job.name, response.message);
            self.state = SessionState::Busy;
            return Err(WidgetError::Busy(response.message));
        }

        info!(
            "Submitted job: name={}, mode={}, files={}, lab={}, identifier={}",
            job.name,
            job.mode,
            job.files.len(),
            job.lab,
            response.identifier
        );

        self.state = SessionState::Polling;
        let mut read = 0usize;

        loop {
            let request = PollRequest {
                identifier: response.identifier.clone(),
                read,
            };

            let packet = match self.transport.check_output(&request).await {
                Ok(packet) => packet,
                Err(e) => {
                    warn!("Failed to poll job {}: {:#}", response.identifier, e);
                    self.state = SessionState::Busy;
                    return Err(WidgetError::busy(&e));
                }
            };

            read += packet.messages.len();
            debug!(
                "Packet for {}: {} messages, completed={}",
                response.identifier,
                packet.messages.len(),
                packet.completed
            );

            match on_packet(&packet) {
                Ok(true) => {
                    info!(
                        "Job completed: identifier={}, status={:?}, messages={}",
                        response.identifier, packet.exit_status, read
                    );
                    self.state = SessionState::Completed;
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => {
                    error!("Job {} output rejected: {}", response.identifier, e);
                    self.state = SessionState::Failed;
                    return Err(e);
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
