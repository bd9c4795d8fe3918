//! # esky-decoder — Esky GPS tracker protocol
//!
//! Decodes the delimited text position reports sent by Esky trackers into normalized
//! [`PositionRecord`]s, and produces the `ACK,<index>#` reply the devices expect over UDP.
//!
//! ## Wire format
//!
//! ```text
//! ET;1;863070021234567;R;9+210101153045+12.345678+-98.765432+0.50+90+0x3+1+12345+12600
//! ```
//!
//! Header, index, identifier, data type `R`, satellites, `yymmdd` + `hhmmss`, latitude,
//! longitude, speed (m/s), course, then the optional extension group (`0x` input bitmask,
//! event, odometer in metres) and the battery voltage in millivolts.
//!
//! - Index and identifier end with `;`; later fields with `+` or `;`.
//! - The extension group (`0x<inputs>`, event, odometer) is present or absent as a whole.
//! - Anything after the battery field is ignored.
//!
//! ## Decoding
//!
//! - [`grammar`]: the pest grammar and the [`grammar::FIELDS`] descriptor table.
//! - [`extract`]: [`extract::FieldCursor`], typed reads in wire order.
//! - [`decoder`]: [`Decoder::decode`], match → ack (datagrams only) → resolve → extract.
//! - [`frame`]: several messages per payload; [`capture`]: payloads from pcap frames.
//!
//! ```no_run
//! use esky_decoder::{Decoder, DeviceRegistry, Transport};
//!
//! let registry = DeviceRegistry::new();
//! registry.register("863070021234567", Some("van 4"));
//! let decoder = Decoder::new(registry);
//! let mut acks = Vec::new();
//! let transport = Transport::Datagram { remote: "10.0.0.5:5000".parse().unwrap() };
//! let record = decoder.decode(
//!     "ET;1;863070021234567;R;9+210101153045+12.345678+-98.765432+0.50+90+0x3+1+12345+12600",
//!     &transport,
//!     &mut acks,
//! );
//! assert!(record.is_ok());
//! assert_eq!(acks[0].to_string(), "ACK,1#");
//! ```

pub mod capture;
pub mod decoder;
pub mod dump;
pub mod extract;
pub mod frame;
pub mod grammar;
pub mod record;
pub mod session;
pub mod units;

pub use decoder::{DecodeError, Decoder};
pub use extract::{FieldCursor, FieldError};
pub use frame::{decode_batch, BatchResult, Rejection};
pub use grammar::{Captures, FieldKind, FieldSpec, MessageGrammar, FIELDS};
pub use record::{AckReply, DeviceRef, PositionRecord, Transport};
pub use session::{DeviceRegistry, DeviceResolver, RegistryError, ReplySink};
