// Connection state machine: status enum, events, and the transition function.
// Pure; the async connection task feeds it events and carries out the returned actions.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting,
    /// Terminal: the connection could not even be constructed (e.g. malformed URL).
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed.
    Opened,
    /// Connect attempt failed, or an open socket closed or errored.
    Closed,
    /// The request could not be built; no retry is possible.
    ConstructFailed,
    /// Backoff delay elapsed.
    RetryElapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Send the entire logical subscription set.
    ReplaySubscriptions,
    ScheduleReconnect(Duration),
    Connect,
    Stop,
}

/// Exponential backoff: `min(base * 2^attempt, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            max: Duration::from_millis(30_000),
        }
    }
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    status: ConnectionStatus,
    attempt: u32,
    backoff: Backoff,
}

impl ConnectionMachine {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            attempt: 0,
            backoff,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Applies one event. Events that make no sense in the current state are ignored.
    pub fn on_event(&mut self, event: TransportEvent) -> Action {
        use ConnectionStatus::*;
        use TransportEvent::*;

        match (self.status, event) {
            (Connecting, Opened) => {
                self.status = Connected;
                self.attempt = 0;
                Action::ReplaySubscriptions
            }
            (Connecting | Connected, Closed) => {
                self.status = Reconnecting;
                Action::ScheduleReconnect(self.backoff.delay(self.attempt))
            }
            (Connecting, ConstructFailed) => {
                self.status = Disconnected;
                Action::Stop
            }
            (Reconnecting, RetryElapsed) => {
                self.attempt = self.attempt.saturating_add(1);
                self.status = Connecting;
                Action::Connect
            }
            (Disconnected, _) => Action::Stop,
            _ => Action::None,
        }
    }
}
