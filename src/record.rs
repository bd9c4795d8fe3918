//! Decoded position records, acknowledgments and transport context.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;

/// Protocol name stamped on every record.
pub const PROTOCOL: &str = "esky";

/// Opaque handle for a resolved device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceRef(pub u64);

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized result of decoding one message.
///
/// The four extension fields (`ignition`, `input1`, `input2`, `event`) and `odometer` are
/// either all set or all `None`; `None` means the device did not report them, not "off".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRecord {
    pub protocol: &'static str,
    pub device: DeviceRef,
    /// Sequence index as sent by the device.
    pub index: u64,
    pub satellites: u32,
    /// Always true: the format has no fix-validity flag.
    pub valid: bool,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Knots.
    pub speed: f64,
    /// Degrees.
    pub course: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignition: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input1: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input2: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<u32>,
    /// Metres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odometer: Option<u64>,
    /// Volts.
    pub battery: f64,
}

/// How a message arrived. Only datagrams are acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Connectionless: every message is individually addressed.
    Datagram { remote: SocketAddr },
    /// Connection-oriented.
    Stream { remote: Option<SocketAddr> },
}

impl Transport {
    pub fn is_connectionless(&self) -> bool {
        matches!(self, Transport::Datagram { .. })
    }

    pub fn remote(&self) -> Option<SocketAddr> {
        match self {
            Transport::Datagram { remote } => Some(*remote),
            Transport::Stream { remote } => *remote,
        }
    }
}

/// `ACK,<index>#`, addressed back to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckReply {
    pub index: u64,
    pub destination: SocketAddr,
}

impl AckReply {
    pub fn new(index: u64, destination: SocketAddr) -> Self {
        AckReply { index, destination }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for AckReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ACK,{}#", self.index)
    }
}
