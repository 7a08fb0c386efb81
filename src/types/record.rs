//! Normalized scan records.
//!
//! Every decoder produces these same two shapes regardless of which masscan
//! output mode wrote the file.

use super::{AppProtocol, IpProtocol, MacAddr, PortStatus, Symbol, TcpFlag};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::net::IpAddr;

/// A port status observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Whether the port was open or closed.
    pub status: Symbol<PortStatus>,
    /// Transport protocol.
    pub protocol: Symbol<IpProtocol>,
    /// Port number.
    pub port: u16,
    /// TCP flags that explain the status, when the format records them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Vec<Symbol<TcpFlag>>>,
    /// TTL of the response packet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u8>,
    /// Address of the scanned host.
    pub ip: IpAddr,
    /// When the response was seen.
    pub timestamp: DateTime<Utc>,
    /// Hardware address for ARP-derived records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacAddr>,
}

impl Status {
    /// Create a status record with no reason, TTL or MAC.
    pub fn new(
        status: impl Into<Symbol<PortStatus>>,
        protocol: impl Into<Symbol<IpProtocol>>,
        port: u16,
        ip: IpAddr,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            status: status.into(),
            protocol: protocol.into(),
            port,
            reason: None,
            ttl: None,
            ip,
            timestamp,
            mac: None,
        }
    }

    /// Set the reason flags.
    pub fn with_reason(mut self, reason: Vec<Symbol<TcpFlag>>) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the hardware address.
    pub fn with_mac(mut self, mac: Option<MacAddr>) -> Self {
        self.mac = mac;
        self
    }

    /// Check if the port was reported open.
    pub fn is_open(&self) -> bool {
        self.status == PortStatus::Open
    }
}

/// A captured application-layer response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    /// Transport protocol.
    pub protocol: Symbol<IpProtocol>,
    /// Port number.
    pub port: u16,
    /// Address of the scanned host.
    pub ip: IpAddr,
    /// When the banner was captured.
    pub timestamp: DateTime<Utc>,
    /// Application protocol; `None` when masscan did not classify it.
    pub app_protocol: Option<Symbol<AppProtocol>>,
    /// Captured bytes.
    #[serde(serialize_with = "serialize_payload")]
    pub payload: Vec<u8>,
}

impl Banner {
    /// Create a banner record.
    pub fn new(
        protocol: impl Into<Symbol<IpProtocol>>,
        port: u16,
        ip: IpAddr,
        timestamp: DateTime<Utc>,
        app_protocol: Option<Symbol<AppProtocol>>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            port,
            ip,
            timestamp,
            app_protocol,
            payload: payload.into(),
        }
    }

    /// The payload as text, replacing invalid UTF-8 sequences.
    pub fn payload_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

fn serialize_payload<S: Serializer>(payload: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(payload))
}

/// A single decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Status(Status),
    Banner(Banner),
}

impl Record {
    /// Address of the scanned host.
    pub fn ip(&self) -> IpAddr {
        match self {
            Self::Status(status) => status.ip,
            Self::Banner(banner) => banner.ip,
        }
    }

    /// Port number.
    pub fn port(&self) -> u16 {
        match self {
            Self::Status(status) => status.port,
            Self::Banner(banner) => banner.port,
        }
    }

    /// Transport protocol.
    pub fn protocol(&self) -> &Symbol<IpProtocol> {
        match self {
            Self::Status(status) => &status.protocol,
            Self::Banner(banner) => &banner.protocol,
        }
    }

    /// Record timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Status(status) => status.timestamp,
            Self::Banner(banner) => banner.timestamp,
        }
    }

    /// Get the status record, if this is one.
    pub fn as_status(&self) -> Option<&Status> {
        match self {
            Self::Status(status) => Some(status),
            Self::Banner(_) => None,
        }
    }

    /// Get the banner record, if this is one.
    pub fn as_banner(&self) -> Option<&Banner> {
        match self {
            Self::Banner(banner) => Some(banner),
            Self::Status(_) => None,
        }
    }
}

impl From<Status> for Record {
    fn from(status: Status) -> Self {
        Self::Status(status)
    }
}

impl From<Banner> for Record {
    fn from(banner: Banner) -> Self {
        Self::Banner(banner)
    }
}
