//! Batch handling: decode a transport payload that may contain one or more messages.
//!
//! A datagram carries exactly one message. A stream payload carries messages terminated by
//! CR and/or LF; the bytes after the last terminator are decoded as a final message too.
//! Messages that fail are reported with their byte range instead of aborting the batch.

use crate::decoder::{DecodeError, Decoder};
use crate::record::{PositionRecord, Transport};
use crate::session::{DeviceResolver, ReplySink};

/// Longest accepted message, terminator excluded.
pub const MAX_MESSAGE_LEN: usize = 1024;

/// Lines found in a stream payload.
#[derive(Debug, Default)]
pub struct FrameSplit {
    /// Byte ranges of complete, non-empty lines.
    pub lines: Vec<(usize, usize)>,
    /// Byte ranges of lines longer than [`MAX_MESSAGE_LEN`].
    pub oversized: Vec<(usize, usize)>,
    /// Start of the unterminated tail (equals the payload length when there is none).
    pub remainder: usize,
}

/// Split a stream payload on CR/LF. Empty lines are skipped.
pub fn split_messages(bytes: &[u8]) -> FrameSplit {
    let mut split = FrameSplit::default();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'\r' && b != b'\n' {
            continue;
        }
        if i > start {
            if i - start > MAX_MESSAGE_LEN {
                split.oversized.push((start, i));
            } else {
                split.lines.push((start, i));
            }
        }
        start = i + 1;
    }
    split.remainder = start;
    split
}

#[derive(Debug)]
pub struct DecodedMessage {
    pub record: PositionRecord,
    pub byte_range: (usize, usize),
}

#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("Message longer than {} bytes", MAX_MESSAGE_LEN)]
    Oversized,
    #[error("Message is not valid UTF-8")]
    NotUtf8,
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug)]
pub struct RejectedMessage {
    pub byte_range: (usize, usize),
    pub reason: Rejection,
}

/// Decoded and rejected messages of one payload.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub decoded: Vec<DecodedMessage>,
    pub rejected: Vec<RejectedMessage>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.decoded.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoded.is_empty() && self.rejected.is_empty()
    }
}

/// Decode every message of a payload.
pub fn decode_batch<R, S>(
    decoder: &Decoder<R>,
    payload: &[u8],
    transport: &Transport,
    sink: &mut S,
) -> BatchResult
where
    R: DeviceResolver,
    S: ReplySink + ?Sized,
{
    let mut result = BatchResult::default();
    if payload.is_empty() {
        return result;
    }

    let ranges = if transport.is_connectionless() {
        vec![(0, trim_terminators(payload))]
    } else {
        let split = split_messages(payload);
        for range in split.oversized {
            result.rejected.push(RejectedMessage {
                byte_range: range,
                reason: Rejection::Oversized,
            });
        }
        let mut ranges = split.lines;
        if split.remainder < payload.len() {
            let range = (split.remainder, payload.len());
            if range.1 - range.0 > MAX_MESSAGE_LEN {
                result.rejected.push(RejectedMessage {
                    byte_range: range,
                    reason: Rejection::Oversized,
                });
            } else {
                ranges.push(range);
            }
        }
        ranges
    };

    for (start, end) in ranges {
        let outcome = std::str::from_utf8(&payload[start..end])
            .map_err(|_| Rejection::NotUtf8)
            .and_then(|text| decoder.decode(text, transport, sink).map_err(Rejection::from));
        match outcome {
            Ok(record) => result.decoded.push(DecodedMessage {
                record,
                byte_range: (start, end),
            }),
            Err(reason) => result.rejected.push(RejectedMessage {
                byte_range: (start, end),
                reason,
            }),
        }
    }
    result
}

fn trim_terminators(payload: &[u8]) -> usize {
    let mut end = payload.len();
    while end > 0 && matches!(payload[end - 1], b'\r' | b'\n') {
        end -= 1;
    }
    end
}
