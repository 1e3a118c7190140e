//! # agrirelay
//!
//! `agrirelay` is the real-time notification relay of an agricultural
//! marketplace. Participants connect over WebSockets, join product rooms or
//! identify themselves, and receive price, order and inventory notifications
//! without polling. Routing is in-memory and best-effort.
//!
//! ## Core Modules
//!
//! - `registry`: live connections and what each one is subscribed to.
//! - `router`: topic membership and fan-out on top of the registry.
//! - `dispatcher`: classifies inbound events and routes them.
//! - `transport`: the WebSocket server and per-connection tasks.
//! - `protocol`: JSON wire messages and topic naming.
//! - `persistence`: the listing-to-supplier directory used for new orders.
//! - `config`: layered configuration (file, environment, defaults).
//! - `utils`: error type and logging setup.

pub mod config;
pub mod dispatcher;
pub mod persistence;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod transport;
pub mod utils;
