//! Transport double replaying canned packets

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::Transport;
use crate::protocol::{ExecutionJob, OutputPacket, PollRequest, SubmitResponse};

#[derive(Default)]
pub struct ScriptedTransport {
    pub fail_submit: bool,
    pub identifier: String,
    packets: Mutex<VecDeque<Result<OutputPacket>>>,
    pub submitted: Mutex<Vec<ExecutionJob>>,
    pub polls: Mutex<Vec<PollRequest>>,
}

impl ScriptedTransport {
    pub fn new(packets: Vec<OutputPacket>) -> Self {
        Self {
            identifier: "job-1".into(),
            packets: Mutex::new(packets.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    pub fn failing_submit() -> Self {
        Self {
            fail_submit: true,
            ..Default::default()
        }
    }

    pub fn push_error(&self, message: &str) {
        self.packets
            .lock()
            .unwrap()
            .push_back(Err(anyhow::anyhow!(message.to_string())));
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn submit(&self, job: &ExecutionJob) -> Result<SubmitResponse> {
        if self.fail_submit {
            anyhow::bail!("connection refused");
        }
        self.submitted.lock().unwrap().push(job.clone());
        Ok(SubmitResponse {
            identifier: self.identifier.clone(),
            message: "no identifier".into(),
        })
    }

    async fn check_output(&self, request: &PollRequest) -> Result<OutputPacket> {
        self.polls.lock().unwrap().push(request.clone());
        self.packets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no more packets")))
    }
}
