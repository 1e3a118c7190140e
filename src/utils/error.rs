//! Error types shared across the relay.
//!
//! Most variants describe per-connection failures that are logged and
//! swallowed by the caller. Only `Bind`, `Config` and `Store` are expected to
//! reach `main` and stop the process.

use std::io;

use thiserror::Error;

use crate::protocol::ListingId;
use crate::registry::ConnectionId;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("connection {0} is not registered")]
    NotRegistered(ConnectionId),

    #[error("no supplier known for listing {0}")]
    UnknownListing(ListingId),

    #[error("connection {0} is closed")]
    TransportClosed(ConnectionId),

    #[error("outbound buffer of connection {0} is full")]
    TransportFull(ConnectionId),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("listing store error: {0}")]
    Store(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RelayResult<T> = Result<T, RelayError>;
