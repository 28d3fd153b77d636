//! Client configuration
//!
//! Loaded from the environment (and an optional `.env` file) by the embedder
//! and handed to the session and transports; nothing in the core reads the
//! environment on its own.

use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
pub const DEFAULT_QUEUE: &str = "widget:queue";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Delay between two `check_output` polls
    pub poll_interval: Duration,
    /// Timeout of a single request to the service
    pub request_timeout: Duration,
    pub redis_url: String,
    /// Redis list jobs are pushed to
    pub queue: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            queue: DEFAULT_QUEUE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Read `WIDGET_*` variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let parse_u64 = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid {}: {}", key, raw)),
                None => Ok(default),
            }
        };

        Ok(Self {
            poll_interval: Duration::from_millis(parse_u64(
                "WIDGET_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            request_timeout: Duration::from_secs(parse_u64(
                "WIDGET_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            redis_url: lookup("WIDGET_REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.into()),
            queue: lookup("WIDGET_QUEUE").unwrap_or_else(|| DEFAULT_QUEUE.into()),
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("WIDGET_POLL_INTERVAL_MS", "10"),
            ("WIDGET_REQUEST_TIMEOUT_SECS", " 5 "),
            ("WIDGET_QUEUE", "learn:queue"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.queue, "learn:queue");
        assert_eq!(config.redis_url, DEFAULT_REDIS_URL);
    }

    #[test]
    fn test_invalid_number() {
        let err = ClientConfig::from_lookup(lookup(&[("WIDGET_POLL_INTERVAL_MS", "fast")]))
            .unwrap_err();
        assert!(err.to_string().contains("WIDGET_POLL_INTERVAL_MS"));
    }
}
