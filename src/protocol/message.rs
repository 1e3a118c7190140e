use serde::{Deserialize, Serialize};

pub type ProductId = u64;
pub type ListingId = u64;
pub type ParticipantId = u64;

/// A supplier changed the price of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub product_id: ProductId,
    pub new_price: f64,
    pub supplier_id: ParticipantId,
}

/// A buyer placed an order against a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacement {
    pub buyer_id: ParticipantId,
    pub listing_id: ListingId,
    pub quantity: u64,
    pub total_price: f64,
}

/// The available quantity of a listing changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryChange {
    pub listing_id: ListingId,
    pub new_quantity: u64,
}

/// Frames a participant may send to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join_product_room", rename_all = "camelCase")]
    JoinProductRoom { product_id: ProductId },

    #[serde(rename = "leave_product_room", rename_all = "camelCase")]
    LeaveProductRoom { product_id: ProductId },

    /// Binds the connection to a participant so it receives `user_<id>`
    /// notifications such as new orders.
    #[serde(rename = "identify", rename_all = "camelCase")]
    Identify { participant_id: ParticipantId },

    #[serde(rename = "update_price")]
    UpdatePrice(PriceChange),

    #[serde(rename = "place_order")]
    PlaceOrder(OrderPlacement),

    #[serde(rename = "update_inventory")]
    UpdateInventory(InventoryChange),
}

/// Notifications pushed by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "price_updated")]
    PriceUpdated(PriceChange),

    #[serde(rename = "new_order")]
    NewOrder(OrderPlacement),

    #[serde(rename = "inventory_updated")]
    InventoryUpdated(InventoryChange),
}
