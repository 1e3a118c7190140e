//! WebSocket notification server
//!
//! Accepts TCP/WebSocket connections and runs one task per connection:
//! - register the connection with the router once the handshake succeeds
//! - decode inbound text frames and hand them to the dispatcher, one at a time
//! - spawn a writer that drains the connection's outbound channel to the socket
//! - deregister on close frame, transport error, writer failure, or idle timeout
//!
//! The writer ends on its own once the connection is deregistered, because
//! the registry held the last sender of its channel. Frames queued before
//! that point are still flushed.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at, timeout, timeout_at};
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::protocol::{CloseFrame, Message as WsMessage};

use crate::config::Settings;
use crate::dispatcher::{Event, EventDispatcher};
use crate::protocol::ClientMessage;
use crate::registry::{Connection, RegistrationHandle};
use crate::router::lock;
use crate::utils::{RelayError, RelayResult};

/// Upper bound on how long a closing connection may spend flushing.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const MIN_IDLE_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_IDLE_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Lifecycle of a single connection. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Open) | (Connecting, Closed) | (Open, Closed)
        )
    }

    /// Move to `next` if allowed. Returns whether the state changed.
    pub fn advance(&mut self, next: ConnectionState) -> bool {
        if self.can_transition_to(next) {
            *self = next;
            true
        } else {
            false
        }
    }
}

/// Why an open connection was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    TransportError(String),
    WriterClosed,
    IdleTimeout,
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    pub max_connections: usize,
    pub idle_timeout: Duration,
    pub outbound_buffer: usize,
}

impl ConnectionLimits {
    /// Configured idle timeout clamped to `[1s, 7 days]`, so deadlines
    /// computed from it can never overflow an `Instant`.
    pub fn effective_idle_timeout(&self) -> Duration {
        self.idle_timeout.clamp(MIN_IDLE_TIMEOUT, MAX_IDLE_TIMEOUT)
    }
}

impl From<&Settings> for ConnectionLimits {
    fn from(settings: &Settings) -> Self {
        Self {
            max_connections: settings.relay.max_connections,
            idle_timeout: settings.idle_timeout(),
            outbound_buffer: settings.relay.outbound_buffer,
        }
    }
}

#[derive(Debug)]
pub struct NotificationServer {
    listener: TcpListener,
    dispatcher: EventDispatcher,
    limits: ConnectionLimits,
}

impl NotificationServer {
    /// Bind the listening socket. This is the only fatal failure of the relay.
    pub async fn bind(settings: &Settings, dispatcher: EventDispatcher) -> RelayResult<Self> {
        let addr = settings.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;

        Ok(Self {
            listener,
            dispatcher,
            limits: ConnectionLimits::from(settings),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever.
    pub async fn run(self) {
        match self.local_addr() {
            Ok(addr) => info!("Notification server listening on ws://{addr}"),
            Err(e) => warn!(error = %e, "Notification server listening on unknown address"),
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tokio::spawn(handle_connection(
                        stream,
                        peer,
                        self.dispatcher.clone(),
                        self.limits,
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

/// Deregisters the connection when dropped, including when the connection
/// task unwinds from a panic.
pub(super) struct Registration {
    pub(super) dispatcher: EventDispatcher,
    pub(super) handle: RegistrationHandle,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Err(e) = self.dispatcher.dispatch(&self.handle, Event::Disconnect) {
            warn!(connection = %self.handle.id(), error = %e, "failed to deregister connection");
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: EventDispatcher,
    limits: ConnectionLimits,
) {
    let mut state = ConnectionState::Connecting;

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake error");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (tx, mut rx) = mpsc::channel::<WsMessage>(limits.outbound_buffer.max(1));
    let ping_tx = tx.clone();
    let handle = {
        let mut router = lock(dispatcher.router());
        if router.connection_count() >= limits.max_connections {
            None
        } else {
            Some(router.register(Connection::new(tx)))
        }
    };
    let Some(handle) = handle else {
        warn!(%peer, max = limits.max_connections, "connection limit reached, refusing");
        let refusal = CloseFrame {
            code: CloseCode::Again,
            reason: "connection limit reached".into(),
        };
        let _ = ws_sender.send(WsMessage::Close(Some(refusal))).await;
        return;
    };
    let registration = Registration {
        dispatcher: dispatcher.clone(),
        handle,
    };
    let handle = &registration.handle;
    state.advance(ConnectionState::Open);
    let conn_id = handle.id().clone();
    info!(connection = %conn_id, %peer, "connection open");

    let mut writer = {
        let conn_id = conn_id.clone();
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    warn!(connection = %conn_id, error = %e, "failed to write to socket");
                    return;
                }
            }
            let _ = ws_sender.close().await;
            debug!(connection = %conn_id, "send loop closed");
        })
    };

    // Pings make idle-but-healthy peers answer with a pong, which counts as
    // inbound traffic for the idle timeout.
    let idle_timeout = limits.effective_idle_timeout();
    let ping_period = idle_timeout / 2;
    let mut ping_timer = interval_at(Instant::now() + ping_period, ping_period);
    let mut idle_deadline = Instant::now() + idle_timeout;

    let reason = loop {
        tokio::select! {
            _ = &mut writer => break CloseReason::WriterClosed,
            _ = ping_timer.tick() => {
                if ping_tx.try_send(WsMessage::Ping(Default::default())).is_err() {
                    debug!(connection = %conn_id, "skipped ping, outbound buffer busy");
                }
            }
            next = timeout_at(idle_deadline, ws_receiver.next()) => {
                idle_deadline = Instant::now() + idle_timeout;
                match next {
                    Err(_) => break CloseReason::IdleTimeout,
                    Ok(None) | Ok(Some(Ok(WsMessage::Close(_)))) => break CloseReason::PeerClosed,
                    Ok(Some(Err(e))) => break CloseReason::TransportError(e.to_string()),
                    Ok(Some(Ok(WsMessage::Text(text)))) => {
                        handle_text(&dispatcher, handle, text.as_str())
                    }
                    Ok(Some(Ok(_))) => {}
                }
            }
        }
    };

    state.advance(ConnectionState::Closed);
    drop(ping_tx);
    drop(registration);
    info!(connection = %conn_id, ?reason, ?state, "connection closed");

    if reason != CloseReason::WriterClosed
        && timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err()
    {
        writer.abort();
    }
}

fn handle_text(dispatcher: &EventDispatcher, handle: &RegistrationHandle, text: &str) {
    let event = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => Event::from(msg),
        Err(err) => {
            warn!(
                connection = %handle.id(),
                error = %err,
                "Invalid client message: {}",
                text.chars().take(100).collect::<String>()
            );
            return;
        }
    };

    let kind = event.kind();
    match dispatcher.dispatch(handle, event) {
        Ok(routed) => debug!(connection = %handle.id(), kind, ?routed, "dispatched event"),
        Err(e) => warn!(connection = %handle.id(), kind, error = %e, "dropped event"),
    }
}
