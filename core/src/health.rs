//! Health signal bus.
//!
//! A broadcast point for systemic failures, created once at startup and
//! shared by handle between the executor and whatever presents service
//! health. Subscribers only see signals published while they are attached;
//! publishing with nobody attached stores nothing.

use std::fmt;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// How many signals a slow subscriber may fall behind before it skips ahead.
const SUBSCRIBER_BACKLOG: usize = 64;

/// Payload-less notification of systemic service degradation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthSignal {
    ServiceUnavailable,
    ServerError,
}

impl HealthSignal {
    /// The event name presentation code listens for.
    pub fn event_name(&self) -> &'static str {
        match self {
            HealthSignal::ServiceUnavailable => "service unavailable",
            HealthSignal::ServerError => "server error",
        }
    }
}

impl fmt::Display for HealthSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

#[derive(Debug, Clone)]
pub struct HealthBus {
    sender: broadcast::Sender<HealthSignal>,
}

impl HealthBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_BACKLOG);
        Self { sender }
    }

    /// Fire-and-forget. Returns how many subscribers the signal reached.
    pub fn publish(&self, signal: HealthSignal) -> usize {
        self.sender.send(signal).unwrap_or(0)
    }

    pub fn subscribe(&self) -> HealthSubscription {
        HealthSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for HealthBus {
    fn default() -> Self {
        Self::new()
    }
}

/// An attached listener. Dropping it (or calling `unsubscribe`) detaches it.
#[derive(Debug)]
pub struct HealthSubscription {
    receiver: broadcast::Receiver<HealthSignal>,
}

impl HealthSubscription {
    /// Next signal, or `None` once every bus handle is gone.
    pub async fn recv(&mut self) -> Option<HealthSignal> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) => return Some(signal),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "health subscriber lagged; signals dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// A signal that is already waiting, if any.
    pub fn try_recv(&mut self) -> Option<HealthSignal> {
        loop {
            match self.receiver.try_recv() {
                Ok(signal) => return Some(signal),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
