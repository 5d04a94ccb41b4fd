use futures::{Stream, StreamExt};
use tokio::sync::mpsc::{self, Receiver, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::NetworkEvent;
use crate::config::SettleConfig;
use crate::detector::{IdleDetector, Settlement};

/// Forwards one event source into a bounded buffer without ever blocking it.
///
/// Each ingestor owns its own task, so a panic while handling an event
/// ends that task only. The polling loop never observes it.
pub struct EventIngestor {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl EventIngestor {
    pub fn spawn<S>(name: &'static str, source: S, capacity: usize) -> (Self, Receiver<NetworkEvent>)
    where
        S: Stream<Item = NetworkEvent> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(async move {
            let mut source = Box::pin(source);
            while let Some(event) = source.next().await {
                match tx.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => trace!(ingestor = name, "buffer full, event dropped"),
                    Err(TrySendError::Closed(_)) => break,
                }
            }
            debug!(ingestor = name, "event source closed");
        });
        (Self { name, handle }, rx)
    }

    /// Tears the ingestor down by dropping its source, mid-receive if need be.
    pub async fn shutdown(mut self) {
        self.handle.abort();
        match (&mut self.handle).await {
            Ok(()) => {}
            Err(e) if e.is_panic() => {
                warn!(ingestor = self.name, "event ingestor panicked, remaining events were lost")
            }
            Err(_) => {}
        }
    }
}

impl Drop for EventIngestor {
    // A render cancelled mid-settle still releases its event sources.
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The consumer ends of both ingestor buffers.
pub struct EventBuffers {
    requests: Receiver<NetworkEvent>,
    responses: Receiver<NetworkEvent>,
}

impl EventBuffers {
    pub fn new(requests: Receiver<NetworkEvent>, responses: Receiver<NetworkEvent>) -> Self {
        Self { requests, responses }
    }

    /// Takes whatever is buffered right now: requests first, then responses,
    /// each in enqueue order. Never waits.
    pub fn drain(&mut self) -> Vec<NetworkEvent> {
        let mut events = Vec::with_capacity(self.requests.len() + self.responses.len());
        drain_into(&mut self.requests, &mut events);
        drain_into(&mut self.responses, &mut events);
        events
    }
}

fn drain_into(rx: &mut Receiver<NetworkEvent>, out: &mut Vec<NetworkEvent>) {
    // Bounded by what is queued at this instant; later arrivals wait a tick.
    for _ in 0..rx.len() {
        match rx.try_recv() {
            Ok(event) => out.push(event),
            Err(_) => break,
        }
    }
}

/// Both ingestors plus their buffers for one render operation.
pub struct NetworkMonitor {
    buffers: EventBuffers,
    ingestors: [EventIngestor; 2],
}

impl NetworkMonitor {
    pub fn start<R, S>(requests: R, responses: S, capacity: usize) -> Self
    where
        R: Stream<Item = NetworkEvent> + Send + 'static,
        S: Stream<Item = NetworkEvent> + Send + 'static,
    {
        let (request_ingestor, request_rx) = EventIngestor::spawn("requests", requests, capacity);
        let (response_ingestor, response_rx) = EventIngestor::spawn("responses", responses, capacity);
        Self {
            buffers: EventBuffers::new(request_rx, response_rx),
            ingestors: [request_ingestor, response_ingestor],
        }
    }

    /// Runs a fresh detector to a terminal state, then stops both ingestors.
    pub async fn settle(mut self, config: &SettleConfig) -> Settlement {
        let settlement = IdleDetector::new(config.clone()).run(&mut self.buffers).await;
        for ingestor in self.ingestors {
            ingestor.shutdown().await;
        }
        settlement
    }
}
