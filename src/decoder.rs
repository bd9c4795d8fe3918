//! Message decoding: match, acknowledge, resolve, extract, derive.

use crate::extract::FieldError;
use crate::grammar::MessageGrammar;
use crate::record::{AckReply, PositionRecord, Transport, PROTOCOL};
use crate::session::{DeviceResolver, ReplySink};
use crate::units::{knots_from_mps, volts_from_millivolts, InputState};
use log::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Not an Esky message; another decoder may claim it.
    #[error("Message does not match the Esky layout")]
    GrammarMismatch,
    /// Well-formed, but the identifier maps to no device.
    #[error("Unknown device: {0}")]
    UnknownDevice(String),
    #[error("Field: {0}")]
    Field(#[from] FieldError),
}

impl DecodeError {
    /// True for the two defined "no decode" outcomes, false for field conversion failures.
    pub fn is_no_decode(&self) -> bool {
        matches!(self, DecodeError::GrammarMismatch | DecodeError::UnknownDevice(_))
    }
}

/// Decoder for one message at a time. Holds no per-message state.
#[derive(Debug)]
pub struct Decoder<R> {
    grammar: &'static MessageGrammar,
    resolver: R,
}

impl<R: DeviceResolver> Decoder<R> {
    pub fn new(resolver: R) -> Self {
        Decoder {
            grammar: MessageGrammar::shared(),
            resolver,
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Decode one message.
    ///
    /// For datagram transport the acknowledgment goes to `sink` as soon as the index is
    /// read, before the device is resolved: an unknown device or a bad field later on does
    /// not withhold it.
    pub fn decode<S: ReplySink + ?Sized>(
        &self,
        message: &str,
        transport: &Transport,
        sink: &mut S,
    ) -> Result<PositionRecord, DecodeError> {
        self.decode_inner(message, transport, sink).map_err(|e| {
            if let DecodeError::Field(ref f) = e {
                warn!("esky: dropping matched message: {}", f);
            }
            e
        })
    }

    fn decode_inner<S: ReplySink + ?Sized>(
        &self,
        message: &str,
        transport: &Transport,
        sink: &mut S,
    ) -> Result<PositionRecord, DecodeError> {
        let captures = match self.grammar.matches(message) {
            Some(c) => c,
            None => {
                trace!("esky: no match for {:?}", message);
                return Err(DecodeError::GrammarMismatch);
            }
        };
        let mut cursor = captures.into_cursor();

        let index: u64 = cursor.next_int()?;
        if let Transport::Datagram { remote } = transport {
            let reply = AckReply::new(index, *remote);
            debug!("esky: {} -> {}", reply, remote);
            sink.send_reply(reply);
        }

        let identifier = cursor.next_text()?;
        let device = match self.resolver.resolve(identifier) {
            Some(d) => d,
            None => {
                debug!("esky: unknown device {}", identifier);
                return Err(DecodeError::UnknownDevice(identifier.to_string()));
            }
        };

        let satellites = cursor.next_int()?;
        let timestamp = cursor.next_date_time()?;
        let latitude = cursor.next_decimal()?;
        let longitude = cursor.next_decimal()?;
        let speed = knots_from_mps(cursor.next_decimal()?);
        let course = cursor.next_decimal()?;

        let mut record = PositionRecord {
            protocol: PROTOCOL,
            device,
            index,
            satellites,
            valid: true,
            timestamp,
            latitude,
            longitude,
            speed,
            course,
            ignition: None,
            input1: None,
            input2: None,
            event: None,
            odometer: None,
            battery: 0.0,
        };

        if cursor.has_extension() {
            let inputs = InputState::from_mask(cursor.next_hex_int()?);
            record.ignition = Some(inputs.ignition);
            record.input1 = Some(inputs.input1);
            record.input2 = Some(inputs.input2);
            record.event = Some(cursor.next_int()?);
            record.odometer = Some(cursor.next_int()?);
        }

        record.battery = volts_from_millivolts(cursor.next_int()?);
        Ok(record)
    }
}
