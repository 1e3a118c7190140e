//! The `transport` module exposes the relay over WebSockets: it accepts
//! connections, drives each one through its lifecycle, and bridges frames
//! to the dispatcher and router.

pub mod websocket;

pub use websocket::{CloseReason, ConnectionLimits, ConnectionState, NotificationServer};
