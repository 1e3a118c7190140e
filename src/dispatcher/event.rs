use crate::protocol::{
    ClientMessage, InventoryChange, OrderPlacement, ParticipantId, PriceChange, product_topic,
};

/// An inbound event after classification.
///
/// `Disconnect` has no wire form; the transport raises it when the socket
/// closes, errors, or idles out.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    JoinTopic { topic: String },
    LeaveTopic { topic: String },
    Identify { participant_id: ParticipantId },
    PriceUpdated(PriceChange),
    OrderPlaced(OrderPlacement),
    InventoryUpdated(InventoryChange),
    Disconnect,
}

impl Event {
    /// Short name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::JoinTopic { .. } => "join_topic",
            Event::LeaveTopic { .. } => "leave_topic",
            Event::Identify { .. } => "identify",
            Event::PriceUpdated(_) => "price_updated",
            Event::OrderPlaced(_) => "order_placed",
            Event::InventoryUpdated(_) => "inventory_updated",
            Event::Disconnect => "disconnect",
        }
    }
}

impl From<ClientMessage> for Event {
    fn from(msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::JoinProductRoom { product_id } => Event::JoinTopic {
                topic: product_topic(product_id),
            },
            ClientMessage::LeaveProductRoom { product_id } => Event::LeaveTopic {
                topic: product_topic(product_id),
            },
            ClientMessage::Identify { participant_id } => Event::Identify { participant_id },
            ClientMessage::UpdatePrice(change) => Event::PriceUpdated(change),
            ClientMessage::PlaceOrder(order) => Event::OrderPlaced(order),
            ClientMessage::UpdateInventory(change) => Event::InventoryUpdated(change),
        }
    }
}
