//! Batch tests: stream splitting, per-message rejection and datagram handling.

use esky_decoder::frame::{decode_batch, split_messages, Rejection, MAX_MESSAGE_LEN};
use esky_decoder::{AckReply, DecodeError, Decoder, DeviceRegistry, Transport};

const MSG_A: &str = "ET;1;863070021234567;R;9+210101153045+12.345678+-98.765432+0.50+90+0x3+1+12345+12600";
const MSG_B: &str = "ET;2;863070021234567;R;6+190317162511+60.26922+25.16030+0.00+0+4062";
const MSG_OTHER_DEVICE: &str = "ET;3;111111111111111;R;6+190317162511+60.26922+25.16030+0.00+0+4062";

fn decoder() -> Decoder<DeviceRegistry> {
    let registry = DeviceRegistry::new();
    registry.register("863070021234567", None);
    Decoder::new(registry)
}

fn stream() -> Transport {
    Transport::Stream { remote: None }
}

#[test]
fn split_on_crlf_and_skip_empty_lines() {
    let payload = b"abc\r\n\r\ndef\nghi";
    let split = split_messages(payload);
    assert_eq!(split.lines, vec![(0, 3), (7, 10)]);
    assert!(split.oversized.is_empty());
    assert_eq!(split.remainder, 11);
    assert_eq!(&payload[split.remainder..], b"ghi");
}

#[test]
fn split_without_terminator_is_all_remainder() {
    let split = split_messages(b"abc");
    assert!(split.lines.is_empty());
    assert_eq!(split.remainder, 0);
}

#[test]
fn split_reports_oversized_lines() {
    let mut payload = vec![b'1'; MAX_MESSAGE_LEN + 1];
    payload.push(b'\n');
    payload.extend_from_slice(b"ok\n");
    let split = split_messages(&payload);
    assert_eq!(split.oversized, vec![(0, MAX_MESSAGE_LEN + 1)]);
    assert_eq!(split.lines, vec![(MAX_MESSAGE_LEN + 2, MAX_MESSAGE_LEN + 4)]);
}

#[test]
fn stream_payload_with_several_messages() {
    let payload = format!("{}\r\n{}\r\n", MSG_A, MSG_B);
    let mut acks: Vec<AckReply> = Vec::new();
    let result = decode_batch(&decoder(), payload.as_bytes(), &stream(), &mut acks);
    assert_eq!(result.decoded.len(), 2);
    assert!(result.rejected.is_empty());
    assert_eq!(result.decoded[0].record.index, 1);
    assert_eq!(result.decoded[1].record.index, 2);
    assert_eq!(result.decoded[1].byte_range.0, MSG_A.len() + 2);
    assert!(acks.is_empty());
}

#[test]
fn unterminated_tail_is_decoded() {
    let payload = format!("{}\n{}", MSG_A, MSG_B);
    let result = decode_batch(&decoder(), payload.as_bytes(), &stream(), &mut ());
    assert_eq!(result.decoded.len(), 2);
}

#[test]
fn bad_message_does_not_stop_the_batch() {
    let payload = format!("{}\nnot esky\n{}\n{}\n", MSG_A, MSG_OTHER_DEVICE, MSG_B);
    let result = decode_batch(&decoder(), payload.as_bytes(), &stream(), &mut ());
    assert_eq!(result.len(), 4);
    assert_eq!(result.decoded.len(), 2);
    assert!(matches!(
        result.rejected[0].reason,
        Rejection::Decode(DecodeError::GrammarMismatch)
    ));
    assert!(matches!(
        &result.rejected[1].reason,
        Rejection::Decode(DecodeError::UnknownDevice(id)) if id == "111111111111111"
    ));
}

#[test]
fn datagram_is_one_message_and_acknowledged() {
    let remote = "192.0.2.10:4000".parse().unwrap();
    let payload = format!("{}\r\n", MSG_B);
    let mut acks = Vec::new();
    let result = decode_batch(
        &decoder(),
        payload.as_bytes(),
        &Transport::Datagram { remote },
        &mut acks,
    );
    assert_eq!(result.decoded.len(), 1);
    assert_eq!(result.decoded[0].byte_range, (0, MSG_B.len()));
    assert_eq!(acks, vec![AckReply::new(2, remote)]);
}

#[test]
fn non_utf8_is_rejected() {
    let result = decode_batch(&decoder(), b"ET;\xff\xfe\n", &stream(), &mut ());
    assert!(result.decoded.is_empty());
    assert!(matches!(result.rejected[0].reason, Rejection::NotUtf8));
}

#[test]
fn empty_payload_yields_nothing() {
    let result = decode_batch(&decoder(), b"", &stream(), &mut ());
    assert!(result.is_empty());
}
