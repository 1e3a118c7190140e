//! Event dispatcher
//!
//! Stateless routing from a classified [`Event`] to the router:
//! - joins, leaves and identification change membership
//! - price updates fan out to `product_<id>`
//! - new orders go to `user_<supplier>` after resolving the listing owner
//! - inventory updates go to every connection
//! - disconnects deregister the connection
//!
//! The supplier lookup runs before the router lock is taken. A failed lookup
//! drops the order and surfaces the error to the caller for logging; it is
//! not retried.

use std::sync::Arc;

use crate::dispatcher::event::Event;
use crate::persistence::ListingDirectory;
use crate::protocol::{ServerMessage, product_topic, user_topic};
use crate::registry::RegistrationHandle;
use crate::router::{DeliveryReport, SharedRouter, lock};
use crate::utils::RelayResult;

/// What a dispatched event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Subscribed { topic: String },
    Unsubscribed { topic: String, was_member: bool },
    Identified { topic: String },
    /// `topic` is `None` for broadcasts to every connection.
    Delivered {
        topic: Option<String>,
        report: DeliveryReport,
    },
    Disconnected { was_registered: bool },
}

#[derive(Clone)]
pub struct EventDispatcher {
    router: SharedRouter,
    listings: Arc<dyn ListingDirectory>,
}

impl EventDispatcher {
    pub fn new(router: SharedRouter, listings: Arc<dyn ListingDirectory>) -> Self {
        Self { router, listings }
    }

    pub fn router(&self) -> &SharedRouter {
        &self.router
    }

    pub fn dispatch(&self, handle: &RegistrationHandle, event: Event) -> RelayResult<Routed> {
        let id = handle.id();

        match event {
            Event::JoinTopic { topic } => {
                lock(&self.router).subscribe(id, &topic)?;
                Ok(Routed::Subscribed { topic })
            }
            Event::LeaveTopic { topic } => {
                let was_member = lock(&self.router).unsubscribe(id, &topic);
                Ok(Routed::Unsubscribed { topic, was_member })
            }
            Event::Identify { participant_id } => {
                let topic = lock(&self.router).identify(id, participant_id)?;
                Ok(Routed::Identified { topic })
            }
            Event::PriceUpdated(change) => {
                let topic = product_topic(change.product_id);
                let event = ServerMessage::PriceUpdated(change);
                let report = lock(&self.router).broadcast(&topic, &event);
                Ok(Routed::Delivered {
                    topic: Some(topic),
                    report,
                })
            }
            Event::OrderPlaced(order) => {
                let supplier = self.listings.resolve(order.listing_id)?;
                let topic = user_topic(supplier);
                let event = ServerMessage::NewOrder(order);
                let report = lock(&self.router).broadcast(&topic, &event);
                Ok(Routed::Delivered {
                    topic: Some(topic),
                    report,
                })
            }
            Event::InventoryUpdated(change) => {
                let event = ServerMessage::InventoryUpdated(change);
                let report = lock(&self.router).broadcast_all(&event);
                Ok(Routed::Delivered {
                    topic: None,
                    report,
                })
            }
            Event::Disconnect => {
                let was_registered = lock(&self.router).deregister(handle);
                Ok(Routed::Disconnected { was_registered })
            }
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}
