//! Connection registry
//!
//! Sole owner of every live [`Connection`]. Other components refer to
//! connections by id only and must treat a failed lookup as the ordinary
//! outcome of a concurrent disconnect.

pub mod connection;

use std::collections::HashMap;

pub use connection::{Connection, ConnectionId};

use crate::protocol::ParticipantId;
use crate::utils::{RelayError, RelayResult};

/// Proof of registration returned by [`ConnectionRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    id: ConnectionId,
}

impl RegistrationHandle {
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Add a connection. Any topics already recorded on it are discarded.
    pub fn register(&mut self, mut connection: Connection) -> RegistrationHandle {
        connection.topics.clear();
        let handle = RegistrationHandle {
            id: connection.id.clone(),
        };
        self.connections.insert(connection.id.clone(), connection);
        handle
    }

    /// Remove a connection. Removing an unknown handle is a no-op and returns `None`.
    pub fn deregister(&mut self, handle: &RegistrationHandle) -> Option<Connection> {
        self.connections.remove(&handle.id)
    }

    pub fn lookup(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// Record which participant is behind a connection.
    pub fn identify(&mut self, id: &ConnectionId, participant: ParticipantId) -> RelayResult<()> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RelayError::NotRegistered(id.clone()))?;
        connection.participant_id = Some(participant);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Returns `Ok(true)` when the topic was newly added to the connection.
    pub(crate) fn track_topic(&mut self, id: &ConnectionId, topic: &str) -> RelayResult<bool> {
        let connection = self
            .connections
            .get_mut(id)
            .ok_or_else(|| RelayError::NotRegistered(id.clone()))?;
        Ok(connection.topics.insert(topic.to_string()))
    }

    pub(crate) fn untrack_topic(&mut self, id: &ConnectionId, topic: &str) -> bool {
        self.connections
            .get_mut(id)
            .is_some_and(|c| c.topics.remove(topic))
    }

    /// Clear and return every topic the connection is subscribed to.
    pub(crate) fn take_topics(&mut self, id: &ConnectionId) -> Vec<String> {
        self.connections
            .get_mut(id)
            .map(|c| c.topics.drain().collect())
            .unwrap_or_default()
    }
}
