//! Router engine
//!
//! The router owns the [`ConnectionRegistry`] together with the topic index
//! so that one lock covers both membership changes and fan-out:
//! - a broadcast enumerates subscribers under the lock, which gives it a
//!   consistent snapshot of the membership at call time
//! - deregistration drops every membership and the connection in one step,
//!   so no notification is enqueued after a disconnect has been observed
//!
//! Delivery never waits. Each subscriber gets an independent `try_send` on
//! its bounded channel; a full or closed channel costs that subscriber the
//! notification and nothing else.
//!
//! The public API is synchronous and meant to be held behind
//! [`SharedRouter`]. Never hold the lock across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::protocol::{ParticipantId, ServerMessage, user_topic};
use crate::registry::{Connection, ConnectionId, ConnectionRegistry, RegistrationHandle};
use crate::router::topic::Topic;
use crate::utils::RelayResult;

pub type SharedRouter = Arc<Mutex<TopicRouter>>;

/// Lock the shared router, recovering the guard if a previous holder panicked.
pub fn lock(router: &SharedRouter) -> MutexGuard<'_, TopicRouter> {
    router.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of a fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub dropped: usize,
}

#[derive(Debug, Default)]
pub struct TopicRouter {
    registry: ConnectionRegistry,
    topics: HashMap<String, Topic>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            topics: HashMap::new(),
        }
    }

    pub fn shared() -> SharedRouter {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn register(&mut self, connection: Connection) -> RegistrationHandle {
        let handle = self.registry.register(connection);
        debug!(connection = %handle.id(), "registered connection");
        handle
    }

    /// Drop every membership of the connection, then the connection itself.
    /// Returns `false` if it was already gone.
    pub fn deregister(&mut self, handle: &RegistrationHandle) -> bool {
        let left = self.unsubscribe_all(handle.id());
        let removed = self.registry.deregister(handle).is_some();
        if removed {
            debug!(connection = %handle.id(), topics = left, "deregistered connection");
        }
        removed
    }

    /// Subscribe a registered connection to `topic`, creating the topic on
    /// first use.
    pub fn subscribe(&mut self, id: &ConnectionId, topic: &str) -> RelayResult<()> {
        self.registry.track_topic(id, topic)?;
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(id.clone());
        Ok(())
    }

    /// Returns `true` if the connection was subscribed.
    pub fn unsubscribe(&mut self, id: &ConnectionId, topic: &str) -> bool {
        self.registry.untrack_topic(id, topic);
        self.remove_member(id, topic)
    }

    /// Leave every topic. Returns how many memberships were dropped.
    pub fn unsubscribe_all(&mut self, id: &ConnectionId) -> usize {
        let topics = self.registry.take_topics(id);
        for topic in &topics {
            self.remove_member(id, topic);
        }
        topics.len()
    }

    /// Bind the connection to `participant` and subscribe it to the
    /// participant topic. Re-identifying moves it off the previous one.
    pub fn identify(
        &mut self,
        id: &ConnectionId,
        participant: ParticipantId,
    ) -> RelayResult<String> {
        let previous = self.registry.lookup(id).and_then(|c| c.participant_id);
        self.registry.identify(id, participant)?;

        if let Some(old) = previous.filter(|old| *old != participant) {
            self.unsubscribe(id, &user_topic(old));
        }

        let topic = user_topic(participant);
        self.subscribe(id, &topic)?;
        Ok(topic)
    }

    /// Deliver `event` to every connection currently subscribed to `topic`.
    pub fn broadcast(&self, topic: &str, event: &ServerMessage) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let Some(entry) = self.topics.get(topic) else {
            debug!(topic, "no subscribers for topic");
            return report;
        };
        let Some(frame) = encode(event) else {
            return report;
        };

        for sub_id in &entry.subscribers {
            match self.registry.lookup(sub_id) {
                Some(connection) => deliver(connection, &frame, &mut report),
                None => {
                    error!(topic, connection = %sub_id, "subscriber missing from registry");
                    report.dropped += 1;
                }
            }
        }

        debug!(topic, delivered = report.delivered, dropped = report.dropped, "broadcast");
        report
    }

    /// Deliver `event` to every registered connection regardless of topic.
    pub fn broadcast_all(&self, event: &ServerMessage) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let Some(frame) = encode(event) else {
            return report;
        };

        for connection in self.registry.iter() {
            deliver(connection, &frame, &mut report);
        }

        debug!(delivered = report.delivered, dropped = report.dropped, "broadcast to all");
        report
    }

    /// Subscriber ids of `topic`, sorted.
    pub fn subscribers(&self, topic: &str) -> Vec<ConnectionId> {
        let mut ids: Vec<_> = self
            .topics
            .get(topic)
            .map(|t| t.subscribers.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, Topic::len)
    }

    pub fn has_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    fn remove_member(&mut self, id: &ConnectionId, topic: &str) -> bool {
        let Some(entry) = self.topics.get_mut(topic) else {
            return false;
        };
        let removed = entry.unsubscribe(id);
        if entry.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }
}

fn encode(event: &ServerMessage) -> Option<WsMessage> {
    match serde_json::to_string(event) {
        Ok(json) => Some(WsMessage::text(json)),
        Err(e) => {
            error!(error = %e, "failed to serialize notification");
            None
        }
    }
}

fn deliver(connection: &Connection, frame: &WsMessage, report: &mut DeliveryReport) {
    match connection.deliver(frame.clone()) {
        Ok(()) => report.delivered += 1,
        Err(e) => {
            warn!(connection = %connection.id, error = %e, "dropping notification");
            report.dropped += 1;
        }
    }
}
