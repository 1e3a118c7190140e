use super::*;
use serde_json::json;

#[test]
fn test_topic_names() {
    assert_eq!(product_topic(123), "product_123");
    assert_eq!(user_topic(456), "user_456");
}

#[test]
fn test_decode_join_product_room() {
    let raw = json!({ "type": "join_product_room", "productId": 123 }).to_string();
    let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
    assert_eq!(msg, ClientMessage::JoinProductRoom { product_id: 123 });
}

#[test]
fn test_decode_update_price() {
    let raw = json!({
        "type": "update_price",
        "productId": 123,
        "newPrice": 50.00,
        "supplierId": 456
    })
    .to_string();
    let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        msg,
        ClientMessage::UpdatePrice(PriceChange {
            product_id: 123,
            new_price: 50.0,
            supplier_id: 456,
        })
    );
}

#[test]
fn test_decode_place_order() {
    let raw = json!({
        "type": "place_order",
        "buyerId": 789,
        "listingId": 101,
        "quantity": 5,
        "totalPrice": 250.00
    })
    .to_string();
    let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
    match msg {
        ClientMessage::PlaceOrder(order) => {
            assert_eq!(order.buyer_id, 789);
            assert_eq!(order.listing_id, 101);
            assert_eq!(order.quantity, 5);
            assert_eq!(order.total_price, 250.0);
        }
        other => panic!("Expected PlaceOrder, got {other:?}"),
    }
}

#[test]
fn test_decode_rejects_unknown_type() {
    let raw = json!({ "type": "subscribe", "topic": "anything" }).to_string();
    assert!(serde_json::from_str::<ClientMessage>(&raw).is_err());
}

#[test]
fn test_decode_rejects_missing_field() {
    let raw = json!({ "type": "update_inventory", "listingId": 101 }).to_string();
    assert!(serde_json::from_str::<ClientMessage>(&raw).is_err());
}

#[test]
fn test_encode_inventory_updated() {
    let msg = ServerMessage::InventoryUpdated(InventoryChange {
        listing_id: 101,
        new_quantity: 95,
    });
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(
        value,
        json!({ "type": "inventory_updated", "listingId": 101, "newQuantity": 95 })
    );
}

#[test]
fn test_encode_new_order_keeps_order_fields() {
    let msg = ServerMessage::NewOrder(OrderPlacement {
        buyer_id: 789,
        listing_id: 101,
        quantity: 5,
        total_price: 250.0,
    });
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "new_order");
    assert_eq!(value["buyerId"], 789);
    assert_eq!(value["listingId"], 101);
    assert_eq!(value["quantity"], 5);
    assert_eq!(value["totalPrice"], 250.0);
}

#[test]
fn test_decode_rejects_non_integer_ids() {
    for raw in [
        json!({ "type": "join_product_room", "productId": "123" }),
        json!({ "type": "join_product_room", "productId": -1 }),
        json!({ "type": "identify", "participantId": "alice" }),
        json!({ "type": "update_inventory", "listingId": -7, "newQuantity": 3 }),
    ] {
        assert!(serde_json::from_str::<ClientMessage>(&raw.to_string()).is_err(), "{raw}");
    }
}
