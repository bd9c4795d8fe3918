//! Capture tests: UDP and TCP payload extraction from hand-built frames.

use esky_decoder::capture::{segment_from_linktype, IpProtocol};
use esky_decoder::Transport;
use pcap_parser::Linktype;
use std::net::SocketAddr;

const PAYLOAD: &[u8] = b"ET;2;863070021234567;R;6+190317162511+60.26922+25.16030+0.00+0+4062";

fn ipv4(protocol: u8, l4: &[u8]) -> Vec<u8> {
    let total = 20 + l4.len();
    let mut ip = vec![
        0x45, 0x00,
        (total >> 8) as u8, total as u8,
        0x00, 0x00, 0x00, 0x00,
        64, protocol, 0x00, 0x00,
        10, 0, 0, 7,
        10, 0, 0, 1,
    ];
    ip.extend_from_slice(l4);
    ip
}

fn udp(payload: &[u8]) -> Vec<u8> {
    let len = 8 + payload.len();
    let mut out = vec![0x13, 0x8d, 0x13, 0x8e, (len >> 8) as u8, len as u8, 0, 0];
    out.extend_from_slice(payload);
    out
}

fn tcp(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 20];
    out[0..2].copy_from_slice(&5005u16.to_be_bytes());
    out[2..4].copy_from_slice(&5006u16.to_be_bytes());
    out[12] = 5 << 4;
    out.extend_from_slice(payload);
    out
}

fn ethernet(l3: &[u8], vlan: bool) -> Vec<u8> {
    let mut frame = vec![0xff; 12];
    if vlan {
        frame.extend_from_slice(&[0x81, 0x00, 0x00, 0x64]);
    }
    frame.extend_from_slice(&[0x08, 0x00]);
    frame.extend_from_slice(l3);
    frame
}

#[test]
fn udp_over_ethernet() {
    let mut frame = ethernet(&ipv4(17, &udp(PAYLOAD)), false);
    // Ethernet padding must not leak into the payload
    frame.extend_from_slice(&[0, 0, 0, 0]);
    let seg = segment_from_linktype(Linktype(1), &frame).expect("segment");
    assert_eq!(seg.protocol, IpProtocol::Udp);
    assert_eq!(seg.payload, PAYLOAD);
    let source: SocketAddr = "10.0.0.7:5005".parse().unwrap();
    assert_eq!(seg.source, source);
    assert_eq!(seg.destination, "10.0.0.1:5006".parse::<SocketAddr>().unwrap());
    assert_eq!(seg.transport(), Transport::Datagram { remote: source });
}

#[test]
fn udp_behind_vlan_tag() {
    let frame = ethernet(&ipv4(17, &udp(PAYLOAD)), true);
    let seg = segment_from_linktype(Linktype(1), &frame).expect("segment");
    assert_eq!(seg.payload, PAYLOAD);
}

#[test]
fn tcp_over_raw_ip() {
    let packet = ipv4(6, &tcp(PAYLOAD));
    let seg = segment_from_linktype(Linktype(101), &packet).expect("segment");
    assert_eq!(seg.protocol, IpProtocol::Tcp);
    assert_eq!(seg.payload, PAYLOAD);
    assert!(!seg.transport().is_connectionless());
    assert_eq!(seg.transport().remote(), Some("10.0.0.7:5005".parse().unwrap()));
}

#[test]
fn linux_cooked_capture() {
    let mut frame = vec![0u8; 14];
    frame.extend_from_slice(&[0x08, 0x00]);
    frame.extend_from_slice(&ipv4(17, &udp(PAYLOAD)));
    let seg = segment_from_linktype(Linktype(113), &frame).expect("segment");
    assert_eq!(seg.payload, PAYLOAD);
}

#[test]
fn ignore_other_protocols_and_linktypes() {
    let icmp = ipv4(1, &[8, 0, 0, 0, 0, 0, 0, 0]);
    assert!(segment_from_linktype(Linktype(101), &icmp).is_none());
    assert!(segment_from_linktype(Linktype(105), &ipv4(17, &udp(PAYLOAD))).is_none());
    assert!(segment_from_linktype(Linktype(1), &[0u8; 10]).is_none());
}

#[test]
fn truncated_udp_is_rejected() {
    let mut packet = ipv4(17, &udp(PAYLOAD));
    packet.truncate(30);
    assert!(segment_from_linktype(Linktype(101), &packet).is_none());
}
