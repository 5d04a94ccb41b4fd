use std::time::Duration;
use tracing::warn;

use crate::duration::parse_duration;

pub const ENV_REQUEST_POLL_RETRIES: &str = "PDF_RENDERER_REQUEST_POLL_RETRIES";
pub const ENV_REQUEST_POLL_INTERVAL: &str = "PDF_RENDERER_REQUEST_POLL_INTERVAL";
// Historical name; the value is any duration string, not a minute count.
pub const ENV_PRINT_DEADLINE: &str = "PDF_RENDERER_PRINT_DEADLINE_MINUTES";

pub const DEFAULT_REQUEST_POLL_RETRIES: u32 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_PRINT_DEADLINE: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_BUFFER_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleConfig {
    /// Consecutive idle polls required before the page counts as settled.
    pub request_poll_retries: u32,
    pub poll_interval: Duration,
    pub print_deadline: Duration,
    /// Per-ingestor buffer size; events beyond it are dropped.
    pub buffer_capacity: usize,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            request_poll_retries: DEFAULT_REQUEST_POLL_RETRIES,
            poll_interval: DEFAULT_POLL_INTERVAL,
            print_deadline: DEFAULT_PRINT_DEADLINE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl SettleConfig {
    pub fn with_request_poll_retries(mut self, retries: u32) -> Self {
        self.request_poll_retries = retries;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_print_deadline(mut self, deadline: Duration) -> Self {
        self.print_deadline = deadline;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    /// Short polls for pages known to be static.
    pub fn fast() -> Self {
        Self {
            request_poll_retries: 3,
            poll_interval: Duration::from_millis(250),
            print_deadline: Duration::from_secs(60),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`; unparseable values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_REQUEST_POLL_RETRIES).filter(|v| !v.is_empty()) {
            match raw.trim().parse::<u32>() {
                Ok(retries) => config.request_poll_retries = retries,
                Err(e) => warn!(var = ENV_REQUEST_POLL_RETRIES, value = %raw, error = %e, "ignoring invalid setting"),
            }
        }

        if let Some(raw) = lookup(ENV_REQUEST_POLL_INTERVAL).filter(|v| !v.is_empty()) {
            match parse_duration(&raw) {
                Ok(interval) => config.poll_interval = interval,
                Err(e) => warn!(var = ENV_REQUEST_POLL_INTERVAL, value = %raw, error = %e, "ignoring invalid setting"),
            }
        }

        if let Some(raw) = lookup(ENV_PRINT_DEADLINE).filter(|v| !v.is_empty()) {
            match parse_duration(&raw) {
                Ok(deadline) => config.print_deadline = deadline,
                Err(e) => warn!(var = ENV_PRINT_DEADLINE, value = %raw, error = %e, "ignoring invalid setting"),
            }
        }

        config
    }
}
