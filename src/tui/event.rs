//! Terminal UI event plumbing

use crate::runtime::{DiscoveryStatus, HealthStatus, RuntimeEvent};
use crossterm::event::{Event as CrosstermEvent, EventStream};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Everything the UI loop reacts to
#[derive(Debug, Clone)]
pub enum UiEvent {
    Terminal(CrosstermEvent),
    Runtime(RuntimeEvent),
    Health(HealthStatus),
    Discovery(DiscoveryStatus),
    /// Time for a background health check
    HealthTick,
}

/// Merges terminal input, runtime snapshots and admin results
pub struct EventHandler {
    sender: mpsc::UnboundedSender<UiEvent>,
    receiver: mpsc::UnboundedReceiver<UiEvent>,
}

impl EventHandler {
    pub fn new(
        runtime_rx: broadcast::Receiver<RuntimeEvent>,
        health_interval: Option<Duration>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(read_terminal(sender.clone()));
        tokio::spawn(forward_runtime(runtime_rx, sender.clone()));
        if let Some(period) = health_interval {
            tokio::spawn(health_ticks(period, sender.clone()));
        }

        Self { sender, receiver }
    }

    /// Sender for background tasks reporting back to the UI
    pub fn sender(&self) -> mpsc::UnboundedSender<UiEvent> {
        self.sender.clone()
    }

    pub async fn next(&mut self) -> Option<UiEvent> {
        self.receiver.recv().await
    }
}

async fn read_terminal(sender: mpsc::UnboundedSender<UiEvent>) {
    let mut reader = EventStream::new();
    loop {
        let crossterm_event = reader.next().fuse();
        tokio::select! {
            () = sender.closed() => break,
            maybe_event = crossterm_event => match maybe_event {
                Some(Ok(event)) => {
                    let _ = sender.send(UiEvent::Terminal(event));
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Terminal input error");
                    break;
                }
                None => break,
            },
        }
    }
}

async fn forward_runtime(
    mut runtime_rx: broadcast::Receiver<RuntimeEvent>,
    sender: mpsc::UnboundedSender<UiEvent>,
) {
    loop {
        match runtime_rx.recv().await {
            Ok(event) => {
                if sender.send(UiEvent::Runtime(event)).is_err() {
                    break;
                }
            }
            // Snapshots are complete, so skipping some loses nothing
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "UI lagged behind runtime");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn health_ticks(period: Duration, sender: mpsc::UnboundedSender<UiEvent>) {
    let mut interval = tokio::time::interval(period);
    // The first tick fires immediately; startup already checks
    interval.tick().await;
    loop {
        interval.tick().await;
        if sender.send(UiEvent::HealthTick).is_err() {
            break;
        }
    }
}
