//! Redis transport
//!
//! Jobs are pushed onto a shared queue together with a per-job result key.
//! The worker serving the queue RPUSHes output packets to that key, and
//! polling BLPOPs them one at a time.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::Transport;
use crate::config::ClientConfig;
use crate::protocol::{ExecutionJob, OutputPacket, PollRequest, SubmitResponse};

/// Result list key prefix
pub const RESULT_KEY_PREFIX: &str = "widget:result:";

/// How long a single poll blocks waiting for the next packet
const POLL_BLOCK_SECS: f64 = 1.0;

/// Job as queued for the worker
#[derive(Serialize)]
struct QueuedJob<'a> {
    result_key: &'a str,
    #[serde(flatten)]
    job: &'a ExecutionJob,
}

/// Transport over a Redis job queue
#[derive(Clone)]
pub struct RedisTransport {
    conn: MultiplexedConnection,
    queue: String,
}

impl RedisTransport {
    /// Connect to `config.redis_url`. Fails immediately when Redis is down;
    /// there is no reconnect loop, a failed round-trip means busy.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let client =
            redis::Client::open(config.redis_url.as_str()).context("Failed to create Redis client")?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .with_context(|| format!("Failed to connect to Redis at {}", config.redis_url))?;
        info!("Connected to Redis at {}", config.redis_url);

        Ok(Self {
            conn,
            queue: config.queue.clone(),
        })
    }
}

/// Result key for a job: content hash of the job plus a per-submission salt
pub fn result_key(job: &ExecutionJob, salt: u128) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(job)?);
    hasher.update(salt.to_le_bytes());
    Ok(format!("{}{:x}", RESULT_KEY_PREFIX, hasher.finalize()))
}

/// Packet for the result of a BLPOP on `key`
fn decode_popped(key: &str, popped: Option<(String, String)>) -> Result<OutputPacket> {
    match popped {
        Some((_, data)) => {
            serde_json::from_str(&data).with_context(|| format!("Invalid packet on {}", key))
        }
        // Nothing yet: an empty, unfinished packet
        None => Ok(OutputPacket::default()),
    }
}

fn submission_salt() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}

#[async_trait]
impl Transport for RedisTransport {
    async fn submit(&self, job: &ExecutionJob) -> Result<SubmitResponse> {
        let key = result_key(job, submission_salt())?;
        let payload = serde_json::to_string(&QueuedJob {
            result_key: &key,
            job,
        })?;

        let mut conn = self.conn.clone();
        conn.rpush::<_, _, ()>(&self.queue, &payload)
            .await
            .with_context(|| format!("Failed to push job to {}", self.queue))?;
        debug!("Queued job {} on {}", key, self.queue);

        Ok(SubmitResponse {
            identifier: key,
            message: String::new(),
        })
    }

    async fn check_output(&self, request: &PollRequest) -> Result<OutputPacket> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = conn
            .blpop(&request.identifier, POLL_BLOCK_SECS)
            .await
            .with_context(|| format!("Failed to read results from {}", request.identifier))?;

        decode_popped(&request.identifier, popped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Resource, Switches};

    fn job(contents: &str) -> ExecutionJob {
        ExecutionJob {
            files: vec![Resource::new("main.adb", contents)],
            main: "main.adb".into(),
            mode: "run".into(),
            switches: Switches::default(),
            name: "demo".into(),
            lab: false,
        }
    }

    #[test]
    fn test_result_key_is_stable_for_same_salt() {
        let a = result_key(&job("null;"), 7).unwrap();
        let b = result_key(&job("null;"), 7).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(RESULT_KEY_PREFIX));
        // sha256 hex digest
        assert_eq!(a.len(), RESULT_KEY_PREFIX.len() + 64);
    }

    #[test]
    fn test_result_key_differs_per_submission_and_content() {
        let base = result_key(&job("null;"), 1).unwrap();
        assert_ne!(base, result_key(&job("null;"), 2).unwrap());
        assert_ne!(base, result_key(&job("raise;"), 1).unwrap());
    }

    #[test]
    fn test_empty_pop_is_unfinished_packet() {
        let packet = decode_popped("widget:result:abc", None).unwrap();
        assert!(!packet.completed);
        assert!(packet.messages.is_empty());
        assert_eq!(packet.exit_status, None);
    }

    #[test]
    fn test_popped_packet_is_parsed() {
        let data = r#"{"output": [{"type": "stdout", "data": "hi"}], "completed": true, "status": 0}"#;
        let packet = decode_popped(
            "widget:result:abc",
            Some(("widget:result:abc".into(), data.into())),
        )
        .unwrap();
        assert!(packet.completed);
        assert_eq!(packet.exit_status, Some(0));
        assert_eq!(packet.messages[0].data_text(), "hi");
    }

    #[test]
    fn test_invalid_popped_packet_names_key() {
        let err = decode_popped(
            "widget:result:abc",
            Some(("widget:result:abc".into(), "not json".into())),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid packet on widget:result:abc"));
    }

    #[test]
    fn test_queued_job_shape() {
        let j = job("null;");
        let value = serde_json::to_value(QueuedJob {
            result_key: "widget:result:abc",
            job: &j,
        })
        .unwrap();
        assert_eq!(value["result_key"], "widget:result:abc");
        assert_eq!(value["main"], "main.adb");
        assert_eq!(value["files"][0]["basename"], "main.adb");
    }
}
