use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::config::SettleConfig;
use crate::ingest::EventBuffers;
use crate::{NetworkEvent, ResponseSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Polling,
    SettledConfirmed,
    DeadlineExceeded,
}

impl DetectorState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, DetectorState::Polling)
    }
}

/// What the detector knew when it stopped polling.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub state: DetectorState,
    pub ticks: u32,
    pub elapsed: Duration,
    pub pending: i64,
    pub summaries: Vec<ResponseSummary>,
}

/// Decides when network activity has settled.
///
/// `pending` counts non-document requests minus non-document responses and
/// may go negative when a response arrives for a request that was never
/// observed. `attempt` counts consecutive polls with `pending <= 0`; any new
/// request resets it. Every render operation owns a fresh instance.
#[derive(Debug)]
pub struct IdleDetector {
    config: SettleConfig,
    pending: i64,
    attempt: u32,
    ticks: u32,
    summaries: Vec<ResponseSummary>,
}

impl IdleDetector {
    pub fn new(config: SettleConfig) -> Self {
        Self {
            config,
            pending: 0,
            attempt: 0,
            ticks: 0,
            summaries: Vec::new(),
        }
    }

    pub fn pending(&self) -> i64 {
        self.pending
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn summaries(&self) -> &[ResponseSummary] {
        &self.summaries
    }

    /// One poll step over the events drained for this tick.
    pub fn tick(&mut self, events: impl IntoIterator<Item = NetworkEvent>) {
        for event in events {
            self.observe(event);
        }
        if self.pending <= 0 {
            self.attempt = self.attempt.saturating_add(1);
        }
        self.ticks += 1;
    }

    fn observe(&mut self, event: NetworkEvent) {
        if event.is_document() {
            return;
        }
        match event {
            NetworkEvent::RequestStarted { url, .. } => {
                debug!(%url, "requested");
                self.pending += 1;
                self.attempt = 0;
            }
            NetworkEvent::ResponseReceived { url, status, status_text, .. } => {
                if status >= 400 {
                    error!(status, %url, "received");
                } else {
                    debug!(status, %url, "received");
                }
                self.summaries.push(ResponseSummary { url, status, status_text });
                self.pending -= 1;
            }
        }
    }

    pub fn state(&self, elapsed: Duration) -> DetectorState {
        if self.attempt >= self.config.request_poll_retries {
            DetectorState::SettledConfirmed
        } else if elapsed >= self.config.print_deadline {
            DetectorState::DeadlineExceeded
        } else {
            DetectorState::Polling
        }
    }

    /// Polls `buffers` every `poll_interval` until settled or out of time.
    pub async fn run(mut self, buffers: &mut EventBuffers) -> Settlement {
        let start = Instant::now();
        loop {
            let elapsed = start.elapsed();
            let state = self.state(elapsed);
            if state.is_terminal() {
                match state {
                    DetectorState::DeadlineExceeded => warn!(
                        pending = self.pending,
                        ticks = self.ticks,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "print deadline reached before network settled, printing anyway"
                    ),
                    _ => info!(
                        ticks = self.ticks,
                        elapsed_ms = elapsed.as_millis() as u64,
                        responses = self.summaries.len(),
                        "network settled"
                    ),
                }
                return Settlement {
                    state,
                    ticks: self.ticks,
                    elapsed,
                    pending: self.pending,
                    summaries: self.summaries,
                };
            }

            sleep(self.config.poll_interval).await;
            let events = buffers.drain();
            self.tick(events);
        }
    }
}
