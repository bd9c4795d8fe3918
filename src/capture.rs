//! Transport payloads from captured link-layer frames (pcap / pcapng input).
//!
//! Supports Ethernet (with 802.1Q / 802.1ad tags), raw IP and Linux cooked captures carrying
//! IPv4 UDP or TCP. IP and UDP length fields bound the payload so Ethernet padding of short
//! frames is not included.

use crate::record::Transport;
use pcap_parser::Linktype;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Udp,
    Tcp,
}

/// Transport-layer payload of one captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub protocol: IpProtocol,
    pub source: SocketAddr,
    pub destination: SocketAddr,
    pub payload: &'a [u8],
}

impl Segment<'_> {
    /// UDP is acknowledged per datagram; TCP is a stream.
    pub fn transport(&self) -> Transport {
        match self.protocol {
            IpProtocol::Udp => Transport::Datagram {
                remote: self.source,
            },
            IpProtocol::Tcp => Transport::Stream {
                remote: Some(self.source),
            },
        }
    }
}

pub fn segment_from_linktype(linktype: Linktype, frame: &[u8]) -> Option<Segment<'_>> {
    let l3 = match linktype.0 {
        1 => ethernet_l3(frame)?,    // DLT_EN10MB
        101 => frame,                // DLT_RAW
        113 => linux_sll_l3(frame)?, // DLT_LINUX_SLL
        _ => return None,
    };
    ipv4_segment(l3)
}

fn ethernet_l3(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() < 14 {
        return None;
    }
    let mut off = 12usize;
    let mut ethertype = u16::from_be_bytes([frame[off], frame[off + 1]]);
    off += 2;
    while ethertype == 0x8100 || ethertype == 0x88a8 {
        if frame.len() < off + 4 {
            return None;
        }
        off += 2; // TCI
        ethertype = u16::from_be_bytes([frame[off], frame[off + 1]]);
        off += 2;
    }
    match ethertype {
        0x0800 => Some(&frame[off..]),
        _ => None,
    }
}

fn linux_sll_l3(frame: &[u8]) -> Option<&[u8]> {
    // SLL v1: 16-byte header, protocol at 14..16
    if frame.len() < 16 {
        return None;
    }
    match u16::from_be_bytes([frame[14], frame[15]]) {
        0x0800 => Some(&frame[16..]),
        _ => None,
    }
}

fn ipv4_segment(l3: &[u8]) -> Option<Segment<'_>> {
    if l3.len() < 20 || l3[0] >> 4 != 4 {
        return None;
    }
    let ihl = (l3[0] & 0x0f) as usize * 4;
    if ihl < 20 || l3.len() < ihl {
        return None;
    }
    let total_len = u16::from_be_bytes([l3[2], l3[3]]) as usize;
    if total_len < ihl {
        return None;
    }
    let l3 = if total_len <= l3.len() { &l3[..total_len] } else { l3 };
    let src = Ipv4Addr::new(l3[12], l3[13], l3[14], l3[15]);
    let dst = Ipv4Addr::new(l3[16], l3[17], l3[18], l3[19]);
    let l4 = &l3[ihl..];
    let (protocol, payload) = match l3[9] {
        17 => (IpProtocol::Udp, udp_payload(l4)?),
        6 => (IpProtocol::Tcp, tcp_payload(l4)?),
        _ => return None,
    };
    let port = |i: usize| u16::from_be_bytes([l4[i], l4[i + 1]]);
    Some(Segment {
        protocol,
        source: SocketAddr::V4(SocketAddrV4::new(src, port(0))),
        destination: SocketAddr::V4(SocketAddrV4::new(dst, port(2))),
        payload,
    })
}

fn udp_payload(udp: &[u8]) -> Option<&[u8]> {
    if udp.len() < 8 {
        return None;
    }
    let udp_len = u16::from_be_bytes([udp[4], udp[5]]) as usize;
    if udp_len < 8 || udp.len() < udp_len {
        return None;
    }
    Some(&udp[8..udp_len])
}

fn tcp_payload(tcp: &[u8]) -> Option<&[u8]> {
    if tcp.len() < 20 {
        return None;
    }
    let data_offset = (tcp[12] >> 4) as usize * 4;
    if data_offset < 20 || tcp.len() < data_offset {
        return None;
    }
    Some(&tcp[data_offset..])
}
