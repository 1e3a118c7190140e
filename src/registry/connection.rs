//! Connection record
//!
//! `Connection` models one open WebSocket and holds the sending side of its
//! bounded outbound channel. The transport drains the receiving side into the
//! socket, so the order of successful `deliver` calls is the order in which
//! frames hit the wire.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{Sender, error::TrySendError};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::protocol::ParticipantId;
use crate::utils::{RelayError, RelayResult};

pub type ConnectionId = String;

#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub participant_id: Option<ParticipantId>,
    pub connected_at: DateTime<Utc>,
    pub(crate) topics: HashSet<String>,
    sender: Sender<WsMessage>,
}

impl Connection {
    /// Create a connection with a fresh `conn-<uuid>` id and no topics.
    pub fn new(sender: Sender<WsMessage>) -> Self {
        Self {
            id: format!("conn-{}", Uuid::new_v4()),
            participant_id: None,
            connected_at: Utc::now(),
            topics: HashSet::new(),
            sender,
        }
    }

    /// Topics this connection is currently subscribed to.
    pub fn topics(&self) -> &HashSet<String> {
        &self.topics
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.topics.contains(topic)
    }

    /// Enqueue a frame without waiting. A full buffer or a closed writer is
    /// reported back so the caller can log and move on.
    pub fn deliver(&self, msg: WsMessage) -> RelayResult<()> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => RelayError::TransportFull(self.id.clone()),
            TrySendError::Closed(_) => RelayError::TransportClosed(self.id.clone()),
        })
    }
}
