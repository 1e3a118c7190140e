use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration for the relay.
///
/// Groups the server address, per-connection limits, the listing directory
/// and logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
    pub listings: ListingSettings,
    pub logging: LoggingSettings,
}

/// Address the notification server binds to.
///
/// Port `0` asks the OS for an ephemeral port.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Per-connection limits.
///
/// `outbound_buffer` is the number of notifications queued for one
/// connection before further ones are dropped.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RelaySettings {
    pub max_connections: usize,
    pub idle_timeout_secs: u64,
    pub outbound_buffer: usize,
}

/// Location of the listing directory.
///
/// `path` is the sled database mapping listings to their suppliers.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ListingSettings {
    pub path: String,
}

/// Logging configuration.
///
/// `level` is used when `RUST_LOG` is not set.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Settings as found in files and the environment.
///
/// Every section may be absent; anything missing is taken from
/// `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub relay: Option<PartialRelaySettings>,
    pub listings: Option<PartialListingSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

/// Partial server section.
///
/// Missing host or port falls back to [`ServerSettings`] defaults.
#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Partial relay section.
///
/// Each limit left out keeps its [`RelaySettings`] default.
#[derive(Debug, Deserialize)]
pub struct PartialRelaySettings {
    pub max_connections: Option<usize>,
    pub idle_timeout_secs: Option<u64>,
    pub outbound_buffer: Option<usize>,
}

/// Partial listings section.
///
/// Without a path the directory opens at the default location.
#[derive(Debug, Deserialize)]
pub struct PartialListingSettings {
    pub path: Option<String>,
}

/// Partial logging section.
///
/// Without a level the relay logs at `info`.
#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.relay.idle_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            relay: RelaySettings {
                max_connections: 1000,
                idle_timeout_secs: 300,
                outbound_buffer: 64,
            },
            listings: ListingSettings {
                path: "listings_db".to_string(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl PartialSettings {
    /// Fill every missing value from `default`.
    pub fn merge(self, default: Settings) -> Settings {
        Settings {
            server: ServerSettings {
                host: self
                    .server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: self
                    .server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
            },
            relay: RelaySettings {
                max_connections: self
                    .relay
                    .as_ref()
                    .and_then(|r| r.max_connections)
                    .unwrap_or(default.relay.max_connections),
                idle_timeout_secs: self
                    .relay
                    .as_ref()
                    .and_then(|r| r.idle_timeout_secs)
                    .unwrap_or(default.relay.idle_timeout_secs),
                outbound_buffer: self
                    .relay
                    .as_ref()
                    .and_then(|r| r.outbound_buffer)
                    .unwrap_or(default.relay.outbound_buffer),
            },
            listings: ListingSettings {
                path: self
                    .listings
                    .and_then(|l| l.path)
                    .unwrap_or(default.listings.path),
            },
            logging: LoggingSettings {
                level: self
                    .logging
                    .and_then(|l| l.level)
                    .unwrap_or(default.logging.level),
            },
        }
    }
}
