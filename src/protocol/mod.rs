//! Wire protocol
//!
//! Every frame is a JSON object tagged by `"type"` with camelCase fields.
//! Inbound frames decode into [`ClientMessage`], outbound notifications are
//! encoded from [`ServerMessage`]. Topic names are derived here so every
//! component agrees on the `product_<id>` / `user_<id>` scheme.
//!
//! Product, listing and participant ids are unsigned 64-bit JSON integers.
//! A frame carrying a string or negative id does not decode; the connection
//! logs and drops it without replying.

pub mod message;

pub use message::{
    ClientMessage, InventoryChange, ListingId, OrderPlacement, ParticipantId, PriceChange,
    ProductId, ServerMessage,
};

/// Topic carrying notifications about a single product.
pub fn product_topic(product_id: ProductId) -> String {
    format!("product_{product_id}")
}

/// Topic addressing a single participant (all of their connections).
pub fn user_topic(participant_id: ParticipantId) -> String {
    format!("user_{participant_id}")
}

#[cfg(test)]
mod tests;
