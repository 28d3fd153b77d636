//! Transport module - Remote run/check service access
//!
//! A job is submitted once (`run_program`) and its output is then fetched
//! packet by packet (`check_output`) until a packet says it is complete:
//! - `HttpTransport`: the service's HTTP endpoints
//! - `RedisTransport`: a Redis job queue with one result list per job
//!
//! Transports do NOT:
//! - Retry failed requests
//! - Interpret packet contents
//! - Wait between polls (the session paces polling)

pub mod http;
pub mod queue;
#[cfg(test)]
pub(crate) mod scripted;

use anyhow::Result;
use async_trait::async_trait;

use crate::protocol::{ExecutionJob, OutputPacket, PollRequest, SubmitResponse};

/// Round-trips to the run/check service
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit a job; the response carries the identifier used for polling
    async fn submit(&self, job: &ExecutionJob) -> Result<SubmitResponse>;

    /// Fetch the output produced since `request.read` messages
    async fn check_output(&self, request: &PollRequest) -> Result<OutputPacket>;
}

// Re-exports
pub use self::http::HttpTransport;
pub use self::queue::RedisTransport;
