//! HTTP transport
//!
//! Talks to the run/check service over `POST {server}/run_program/` and
//! `POST {server}/check_output/` with JSON bodies.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::Transport;
use crate::config::ClientConfig;
use crate::protocol::{ExecutionJob, OutputPacket, PollRequest, SubmitResponse};

/// Transport for the service's HTTP endpoints
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    /// Server base address, e.g. `https://cloudchecker.example.com`
    server: String,
}

impl HttpTransport {
    pub fn new(server: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            server: server.into(),
        })
    }

    /// Full address of an endpoint: `{server}/{endpoint}/`
    pub fn address(&self, endpoint: &str) -> String {
        format!("{}/{}/", self.server.trim_end_matches('/'), endpoint)
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.address(endpoint);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Service error from {}", url))?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Invalid response from {}", url))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, job: &ExecutionJob) -> Result<SubmitResponse> {
        self.post("run_program", job).await
    }

    async fn check_output(&self, request: &PollRequest) -> Result<OutputPacket> {
        self.post("check_output", request).await
    }
}
