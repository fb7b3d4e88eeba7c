// Resilient stream transport.
// One task owns the physical socket, reconnects with capped backoff and replays the
// logical subscription set; handles only touch the set and a best-effort outbound queue.

mod state;
mod subscriptions;

pub use state::{Action, Backoff, ConnectionMachine, ConnectionStatus, TransportEvent};
pub use subscriptions::SubscriptionSet;

use bytes::Bytes;
use futures_util::{Sink, SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{InvalidHeaderValue, USER_AGENT};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use crate::config::StreamConfig;
use crate::dispatch::Dispatcher;
use crate::protocol::ClientMessage;
use crate::version;

pub const PING_INTERVAL: Duration = Duration::from_secs(30);
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid stream url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
    #[error("encoding control frame: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("websocket: {0}")]
    Socket(#[from] tungstenite::Error),
    #[error("send timed out after {0:?}")]
    SendTimeout(Duration),
    #[error("connection closed by peer")]
    Closed,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    pub backoff: Backoff,
    /// Seeds the subscription set before the first connect.
    pub targets: Vec<String>,
    pub agents: Vec<String>,
}

impl From<&StreamConfig> for TransportConfig {
    fn from(c: &StreamConfig) -> Self {
        Self {
            url: c.url.clone(),
            backoff: Backoff {
                base: Duration::from_millis(c.reconnect_base_ms),
                max: Duration::from_millis(c.reconnect_max_ms),
            },
            targets: c.targets.clone(),
            agents: c.agents.clone(),
        }
    }
}

/// Cloneable control surface for the transport task.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    subscriptions: Arc<Mutex<SubscriptionSet>>,
    outbound: mpsc::UnboundedSender<ClientMessage>,
    status: watch::Receiver<ConnectionStatus>,
    cancel: CancellationToken,
}

impl TransportHandle {
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn status_receiver(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Copy of the current logical subscription set.
    pub fn subscriptions(&self) -> SubscriptionSet {
        self.subscriptions.lock().clone()
    }

    pub fn subscribe<S: AsRef<str>>(&self, target_ids: &[S]) {
        self.subscriptions.lock().add_targets(target_ids);
        self.send(ClientMessage::Subscribe {
            target_ids: to_owned_ids(target_ids),
        });
    }

    pub fn unsubscribe<S: AsRef<str>>(&self, target_ids: &[S]) {
        self.subscriptions.lock().remove_targets(target_ids);
        self.send(ClientMessage::Unsubscribe {
            target_ids: to_owned_ids(target_ids),
        });
    }

    pub fn subscribe_traffic<S: AsRef<str>>(&self, agent_ids: &[S]) {
        self.subscriptions.lock().add_agents(agent_ids);
        self.send(ClientMessage::SubscribeTraffic {
            agent_ids: to_owned_ids(agent_ids),
        });
    }

    pub fn unsubscribe_traffic<S: AsRef<str>>(&self, agent_ids: &[S]) {
        self.subscriptions.lock().remove_agents(agent_ids);
        self.send(ClientMessage::UnsubscribeTraffic {
            agent_ids: to_owned_ids(agent_ids),
        });
    }

    /// Best effort: silently dropped unless the connection is open. Control frames are
    /// idempotent and the whole set is replayed on the next successful connect.
    pub fn send(&self, msg: ClientMessage) {
        if self.status() != ConnectionStatus::Connected {
            tracing::debug!(?msg, "not connected; control frame dropped");
            return;
        }
        let _ = self.outbound.send(msg);
    }

    /// Cancels any pending reconnect and closes the socket. No retry is scheduled afterwards.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

fn to_owned_ids<S: AsRef<str>>(ids: &[S]) -> Vec<String> {
    ids.iter().map(|id| id.as_ref().to_string()).collect()
}

/// Starts the connection task. Frames are handed to `dispatcher` in arrival order.
pub fn spawn(
    dispatcher: Dispatcher,
    config: TransportConfig,
) -> (TransportHandle, tokio::task::JoinHandle<()>) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
    let mut initial = SubscriptionSet::new();
    initial.add_targets(&config.targets);
    initial.add_agents(&config.agents);
    let subscriptions = Arc::new(Mutex::new(initial));
    let cancel = CancellationToken::new();

    let handle = TransportHandle {
        subscriptions: subscriptions.clone(),
        outbound: outbound_tx,
        status: status_rx,
        cancel: cancel.clone(),
    };
    let connection = Connection {
        url: config.url,
        machine: ConnectionMachine::new(config.backoff),
        dispatcher,
        subscriptions,
        outbound: outbound_rx,
        status: status_tx,
        cancel,
    };
    (handle, tokio::spawn(connection.run()))
}

fn build_request(url: &str) -> Result<Request, TransportError> {
    let mut request = url
        .into_client_request()
        .map_err(|source| TransportError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
    request
        .headers_mut()
        .insert(USER_AGENT, HeaderValue::from_str(&version::user_agent())?);
    Ok(request)
}

enum SessionEnd {
    Cancelled,
    Closed(TransportError),
}

struct Connection {
    url: String,
    machine: ConnectionMachine,
    dispatcher: Dispatcher,
    subscriptions: Arc<Mutex<SubscriptionSet>>,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    status: watch::Sender<ConnectionStatus>,
    cancel: CancellationToken,
}

impl Connection {
    fn apply(&mut self, event: TransportEvent) -> Action {
        let before = self.machine.status();
        let action = self.machine.on_event(event);
        let after = self.machine.status();
        if before != after {
            tracing::info!(from = %before, to = %after, attempt = self.machine.attempt(), "stream status");
            self.status.send_replace(after);
        }
        action
    }

    #[tracing::instrument(name = "transport", skip_all, fields(url = %self.url))]
    async fn run(mut self) {
        loop {
            let request = match build_request(&self.url) {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(error = %e, operation = "build_request", "stream transport cannot start");
                    self.apply(TransportEvent::ConstructFailed);
                    break;
                }
            };

            let connected = tokio::select! {
                _ = self.cancel.cancelled() => break,
                r = connect_async(request) => r,
            };

            match connected {
                Ok((socket, _)) => {
                    // Frames queued for an earlier connection are stale.
                    while self.outbound.try_recv().is_ok() {}
                    if self.apply(TransportEvent::Opened) == Action::ReplaySubscriptions {
                        match self.session(socket).await {
                            SessionEnd::Cancelled => break,
                            SessionEnd::Closed(e) => {
                                tracing::warn!(error = %e, operation = "session", "stream connection lost");
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, operation = "connect", "stream connect failed");
                }
            }

            let delay = match self.apply(TransportEvent::Closed) {
                Action::ScheduleReconnect(d) => d,
                _ => break,
            };
            tracing::info!(delay_ms = delay.as_millis() as u64, "reconnecting");
            if !self.wait_for_retry(delay).await {
                break;
            }
            self.apply(TransportEvent::RetryElapsed);
        }
        tracing::debug!("stream transport stopped");
    }

    /// Sleeps out the backoff, discarding control frames meant for a live connection.
    /// Returns false when torn down meanwhile.
    async fn wait_for_retry(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                _ = &mut sleep => return true,
                Some(msg) = self.outbound.recv() => {
                    tracing::debug!(?msg, "not connected; control frame dropped");
                }
            }
        }
    }

    async fn session(&mut self, socket: Socket) -> SessionEnd {
        let (mut sink, mut stream) = socket.split();

        let replay = self.subscriptions.lock().replay_messages();
        for msg in &replay {
            if let Err(e) = send_control(&mut sink, msg).await {
                return SessionEnd::Closed(e);
            }
        }
        if !replay.is_empty() {
            tracing::debug!(frames = replay.len(), "subscriptions replayed");
        }

        let mut ping_interval = tokio::time::interval(PING_INTERVAL);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ping_interval.reset();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = timeout(SEND_TIMEOUT, sink.send(Message::Close(None))).await;
                    return SessionEnd::Cancelled;
                }
                Some(msg) = self.outbound.recv() => {
                    if let Err(e) = send_control(&mut sink, &msg).await {
                        return SessionEnd::Closed(e);
                    }
                }
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            self.dispatcher.dispatch(text.as_str());
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            return SessionEnd::Closed(TransportError::Closed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return SessionEnd::Closed(e.into()),
                    }
                }
                _ = ping_interval.tick() => {
                    if let Err(e) = send_with_timeout(&mut sink, Message::Ping(Bytes::new())).await {
                        return SessionEnd::Closed(e);
                    }
                }
            }
        }
    }
}

async fn send_control<S>(sink: &mut S, msg: &ClientMessage) -> Result<(), TransportError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let json = msg.encode()?;
    send_with_timeout(sink, Message::Text(json.into())).await
}

async fn send_with_timeout<S>(sink: &mut S, message: Message) -> Result<(), TransportError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    match timeout(SEND_TIMEOUT, sink.send(message)).await {
        Ok(result) => result.map_err(TransportError::from),
        Err(_) => Err(TransportError::SendTimeout(SEND_TIMEOUT)),
    }
}
