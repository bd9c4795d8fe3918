//! Collaborators of the decoder: device resolution and reply hand-off.
//!
//! The decoder only needs two capabilities from its surroundings. [`DeviceResolver`] maps the
//! identifier string of a message to a [`DeviceRef`]; [`ReplySink`] accepts acknowledgments
//! for the transport to deliver. [`DeviceRegistry`] is an in-memory resolver that can be
//! loaded from a device list file.

use crate::record::{AckReply, DeviceRef};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

/// Maps a device identifier to a device handle. `None` means "drop this message".
pub trait DeviceResolver {
    fn resolve(&self, identifier: &str) -> Option<DeviceRef>;
}

/// Accepts acknowledgments for delivery. Fire and forget.
pub trait ReplySink {
    fn send_reply(&mut self, reply: AckReply);
}

/// Collects replies.
impl ReplySink for Vec<AckReply> {
    fn send_reply(&mut self, reply: AckReply) {
        self.push(reply);
    }
}

/// Drops replies.
impl ReplySink for () {
    fn send_reply(&mut self, _reply: AckReply) {}
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line}: invalid device identifier {identifier:?}")]
    InvalidIdentifier { line: usize, identifier: String },
    #[error("Line {line}: duplicate device identifier {identifier}")]
    Duplicate { line: usize, identifier: String },
}

#[derive(Debug, Clone)]
struct DeviceEntry {
    device: DeviceRef,
    name: Option<String>,
}

#[derive(Debug, Default)]
struct Devices {
    by_identifier: HashMap<String, DeviceEntry>,
    next_id: u64,
}

impl Devices {
    fn insert(&mut self, identifier: &str, name: Option<String>) -> DeviceRef {
        self.next_id += 1;
        let device = DeviceRef(self.next_id);
        self.by_identifier
            .insert(identifier.to_string(), DeviceEntry { device, name });
        device
    }
}

/// In-memory identifier to device mapping.
///
/// With `accept_unknown`, identifiers that are not registered yet are registered on first
/// sight instead of being rejected.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<Devices>,
    accept_unknown: bool,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_unknown(mut self, accept: bool) -> Self {
        self.accept_unknown = accept;
        self
    }

    /// Register an identifier, returning its handle. Re-registering keeps the existing handle.
    pub fn register(&self, identifier: &str, name: Option<&str>) -> DeviceRef {
        let mut devices = self.devices.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = devices.by_identifier.get(identifier) {
            return entry.device;
        }
        devices.insert(identifier, name.map(str::to_string))
    }

    pub fn get(&self, identifier: &str) -> Option<DeviceRef> {
        let devices = self.devices.read().unwrap_or_else(|e| e.into_inner());
        devices.by_identifier.get(identifier).map(|e| e.device)
    }

    pub fn name(&self, identifier: &str) -> Option<String> {
        let devices = self.devices.read().unwrap_or_else(|e| e.into_inner());
        devices
            .by_identifier
            .get(identifier)
            .and_then(|e| e.name.clone())
    }

    pub fn len(&self) -> usize {
        let devices = self.devices.read().unwrap_or_else(|e| e.into_inner());
        devices.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse a device list: one `identifier [name]` per line; blank lines and `#` comments
    /// are skipped. Identifiers are decimal digits and must be unique.
    pub fn parse(source: &str) -> Result<Self, RegistryError> {
        let mut devices = Devices::default();
        for (i, raw) in source.lines().enumerate() {
            let line_no = i + 1;
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            let (identifier, name) = match line.split_once(char::is_whitespace) {
                Some((id, rest)) => (id, Some(rest.trim().to_string())),
                None => (line, None),
            };
            if !identifier.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RegistryError::InvalidIdentifier {
                    line: line_no,
                    identifier: identifier.to_string(),
                });
            }
            if devices.by_identifier.contains_key(identifier) {
                return Err(RegistryError::Duplicate {
                    line: line_no,
                    identifier: identifier.to_string(),
                });
            }
            devices.insert(identifier, name.filter(|n| !n.is_empty()));
        }
        Ok(DeviceRegistry {
            devices: RwLock::new(devices),
            accept_unknown: false,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }
}

impl DeviceResolver for DeviceRegistry {
    fn resolve(&self, identifier: &str) -> Option<DeviceRef> {
        match self.get(identifier) {
            Some(device) => Some(device),
            None if self.accept_unknown => {
                let device = self.register(identifier, None);
                log::info!("registered device {} as {}", identifier, device);
                Some(device)
            }
            None => None,
        }
    }
}

impl<R: DeviceResolver + ?Sized> DeviceResolver for &R {
    fn resolve(&self, identifier: &str) -> Option<DeviceRef> {
        (**self).resolve(identifier)
    }
}
