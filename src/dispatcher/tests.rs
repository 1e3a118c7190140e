use std::collections::HashMap;
use std::sync::Arc;

use super::{Event, EventDispatcher, Routed};
use crate::persistence::ListingDirectory;
use crate::protocol::{ClientMessage, InventoryChange, OrderPlacement, PriceChange, ServerMessage};
use crate::registry::{Connection, RegistrationHandle};
use crate::router::{TopicRouter, lock};
use crate::utils::RelayError;
use serde_json::json;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

fn dispatcher() -> EventDispatcher {
    let listings: HashMap<u64, u64> = HashMap::from([(101, 456)]);
    let listings: Arc<dyn ListingDirectory> = Arc::new(listings);
    EventDispatcher::new(TopicRouter::shared(), listings)
}

fn connect(dispatcher: &EventDispatcher) -> (RegistrationHandle, mpsc::Receiver<WsMessage>) {
    let (tx, rx) = mpsc::channel::<WsMessage>(8);
    let handle = lock(dispatcher.router()).register(Connection::new(tx));
    (handle, rx)
}

// Decodes a raw frame the way the transport does before dispatching it.
fn handle_message(dispatcher: &EventDispatcher, handle: &RegistrationHandle, raw: String) -> Routed {
    let msg: ClientMessage = serde_json::from_str(&raw).unwrap();
    dispatcher.dispatch(handle, Event::from(msg)).unwrap()
}

fn received(rx: &mut mpsc::Receiver<WsMessage>) -> Option<ServerMessage> {
    let msg = rx.try_recv().ok()?;
    Some(serde_json::from_str(msg.to_text().unwrap()).unwrap())
}

#[test]
fn test_classify_client_messages() {
    assert_eq!(
        Event::from(ClientMessage::JoinProductRoom { product_id: 7 }),
        Event::JoinTopic {
            topic: "product_7".to_string()
        }
    );
    assert_eq!(
        Event::from(ClientMessage::LeaveProductRoom { product_id: 7 }),
        Event::LeaveTopic {
            topic: "product_7".to_string()
        }
    );
    assert_eq!(
        Event::from(ClientMessage::Identify { participant_id: 9 }).kind(),
        "identify"
    );
}

#[test]
fn test_join_product_room() {
    let dispatcher = dispatcher();
    let (a, _rx) = connect(&dispatcher);

    let routed = handle_message(
        &dispatcher,
        &a,
        json!({ "type": "join_product_room", "productId": 123 }).to_string(),
    );
    assert_eq!(
        routed,
        Routed::Subscribed {
            topic: "product_123".to_string()
        }
    );
    assert_eq!(lock(dispatcher.router()).subscribers("product_123"), vec![a.id().clone()]);
}

#[test]
fn test_leave_product_room() {
    let dispatcher = dispatcher();
    let (a, _rx) = connect(&dispatcher);
    handle_message(
        &dispatcher,
        &a,
        json!({ "type": "join_product_room", "productId": 123 }).to_string(),
    );

    let routed = handle_message(
        &dispatcher,
        &a,
        json!({ "type": "leave_product_room", "productId": 123 }).to_string(),
    );
    assert_eq!(
        routed,
        Routed::Unsubscribed {
            topic: "product_123".to_string(),
            was_member: true
        }
    );
    assert!(!lock(dispatcher.router()).has_topic("product_123"));
}

#[test]
fn test_price_update_reaches_product_subscribers_only() {
    let dispatcher = dispatcher();
    let (a, mut rx_a) = connect(&dispatcher);
    let (b, mut rx_b) = connect(&dispatcher);
    let (c, mut rx_c) = connect(&dispatcher);
    for handle in [&a, &b] {
        handle_message(
            &dispatcher,
            handle,
            json!({ "type": "join_product_room", "productId": 123 }).to_string(),
        );
    }

    let routed = handle_message(
        &dispatcher,
        &c,
        json!({ "type": "update_price", "productId": 123, "newPrice": 50.00, "supplierId": 456 })
            .to_string(),
    );
    match routed {
        Routed::Delivered { topic, report } => {
            assert_eq!(topic.as_deref(), Some("product_123"));
            assert_eq!(report.delivered, 2);
        }
        other => panic!("Expected Delivered, got {other:?}"),
    }

    let expected = ServerMessage::PriceUpdated(PriceChange {
        product_id: 123,
        new_price: 50.0,
        supplier_id: 456,
    });
    assert_eq!(received(&mut rx_a), Some(expected.clone()));
    assert_eq!(received(&mut rx_b), Some(expected));
    assert_eq!(received(&mut rx_c), None);
}

#[test]
fn test_order_reaches_supplier() {
    let dispatcher = dispatcher();
    let (supplier, mut rx_supplier) = connect(&dispatcher);
    let (buyer, mut rx_buyer) = connect(&dispatcher);
    handle_message(
        &dispatcher,
        &supplier,
        json!({ "type": "identify", "participantId": 456 }).to_string(),
    );

    handle_message(
        &dispatcher,
        &buyer,
        json!({ "type": "place_order", "buyerId": 789, "listingId": 101, "quantity": 5, "totalPrice": 250.00 })
            .to_string(),
    );

    assert_eq!(
        received(&mut rx_supplier),
        Some(ServerMessage::NewOrder(OrderPlacement {
            buyer_id: 789,
            listing_id: 101,
            quantity: 5,
            total_price: 250.0,
        }))
    );
    assert_eq!(received(&mut rx_buyer), None);
}

#[test]
fn test_order_without_connected_supplier_is_silent() {
    let dispatcher = dispatcher();
    let (buyer, mut rx_buyer) = connect(&dispatcher);

    let routed = handle_message(
        &dispatcher,
        &buyer,
        json!({ "type": "place_order", "buyerId": 789, "listingId": 101, "quantity": 5, "totalPrice": 250.00 })
            .to_string(),
    );
    match routed {
        Routed::Delivered { topic, report } => {
            assert_eq!(topic.as_deref(), Some("user_456"));
            assert_eq!(report.delivered, 0);
        }
        other => panic!("Expected Delivered, got {other:?}"),
    }
    assert_eq!(received(&mut rx_buyer), None);
}

#[test]
fn test_order_for_unknown_listing_is_dropped() {
    let dispatcher = dispatcher();
    let (supplier, mut rx_supplier) = connect(&dispatcher);
    let (buyer, _rx_buyer) = connect(&dispatcher);
    lock(dispatcher.router()).identify(supplier.id(), 456).unwrap();

    let order = OrderPlacement {
        buyer_id: 789,
        listing_id: 999,
        quantity: 1,
        total_price: 10.0,
    };
    let err = dispatcher.dispatch(&buyer, Event::OrderPlaced(order)).unwrap_err();
    assert!(matches!(err, RelayError::UnknownListing(999)));
    assert_eq!(received(&mut rx_supplier), None);
}

#[test]
fn test_inventory_update_reaches_everyone() {
    let dispatcher = dispatcher();
    let (a, mut rx_a) = connect(&dispatcher);
    let (_b, mut rx_b) = connect(&dispatcher);
    handle_message(
        &dispatcher,
        &a,
        json!({ "type": "join_product_room", "productId": 1 }).to_string(),
    );

    handle_message(
        &dispatcher,
        &a,
        json!({ "type": "update_inventory", "listingId": 101, "newQuantity": 95 }).to_string(),
    );

    let expected = ServerMessage::InventoryUpdated(InventoryChange {
        listing_id: 101,
        new_quantity: 95,
    });
    assert_eq!(received(&mut rx_a), Some(expected.clone()));
    assert_eq!(received(&mut rx_b), Some(expected));
}

#[test]
fn test_disconnect_is_idempotent() {
    let dispatcher = dispatcher();
    let (a, mut rx_a) = connect(&dispatcher);
    handle_message(
        &dispatcher,
        &a,
        json!({ "type": "join_product_room", "productId": 123 }).to_string(),
    );

    assert_eq!(
        dispatcher.dispatch(&a, Event::Disconnect).unwrap(),
        Routed::Disconnected {
            was_registered: true
        }
    );
    assert_eq!(
        dispatcher.dispatch(&a, Event::Disconnect).unwrap(),
        Routed::Disconnected {
            was_registered: false
        }
    );

    let router = lock(dispatcher.router());
    assert!(!router.has_topic("product_123"));
    router.broadcast_all(&ServerMessage::InventoryUpdated(InventoryChange {
        listing_id: 1,
        new_quantity: 1,
    }));
    assert_eq!(received(&mut rx_a), None);
}

#[test]
fn test_join_after_disconnect_is_rejected() {
    let dispatcher = dispatcher();
    let (a, _rx_a) = connect(&dispatcher);
    dispatcher.dispatch(&a, Event::Disconnect).unwrap();

    let err = dispatcher
        .dispatch(
            &a,
            Event::JoinTopic {
                topic: "product_1".to_string(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, RelayError::NotRegistered(_)));
    assert!(!lock(dispatcher.router()).has_topic("product_1"));
}
