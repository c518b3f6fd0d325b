use std::net::IpAddr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A server configuration record.
///
/// The table may hold many rows (history); only the row with the greatest
/// `updated_at` is ever served.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The unique identifier for the configuration row.
    pub id: Uuid,
    /// The VPN server address. Stored as text, parsed on read.
    pub server_ip: IpAddr,
    /// The VPN server port. Always positive.
    pub port: i32,
    /// The tunnel protocol, e.g. "tcp" or "udp".
    pub protocol: String,
    /// The DNS server handed to clients.
    pub dns: String,
    /// An optional operator message.
    pub message: Option<String>,
    /// The timestamp set on save.
    pub updated_at: DateTime<Utc>,
}

/// The writable fields of a [`ServerConfig`].
///
/// Configuration rows are written out-of-band; the HTTP API never creates
/// or updates them.
#[derive(Debug, Clone)]
pub struct NewServerConfig {
    pub server_ip: IpAddr,
    pub port: i32,
    pub protocol: String,
    pub dns: String,
    pub message: Option<String>,
}
