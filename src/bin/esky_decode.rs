//! Decode Esky position reports from a capture file or a text file.
//!
//! Usage:
//!   esky_decode [OPTIONS] [INPUT]
//!
//! INPUT is a pcap/pcapng capture (UDP and TCP payloads are decoded) or a text file with one
//! message per line; `-` or no INPUT reads text from stdin. Records go to stdout, as a dump
//! or as JSON lines with `--json`; the summary goes to stderr.

use clap::{Parser, ValueEnum};
use esky_decoder::capture::segment_from_linktype;
use esky_decoder::dump::format_record;
use esky_decoder::frame::{decode_batch, BatchResult, Rejection};
use esky_decoder::{AckReply, DecodeError, Decoder, DeviceRegistry, Transport};
use log::{debug, info};
use pcap_parser::pcapng::Block as PcapNgBlock;
use pcap_parser::traits::{PcapNGPacketBlock, PcapReaderIterator};
use pcap_parser::{Linktype, PcapBlockOwned, PcapError};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportArg {
    Udp,
    Tcp,
}

#[derive(Debug, Parser)]
#[command(name = "esky_decode", about = "Decode Esky GPS tracker messages")]
struct Args {
    /// Capture (pcap/pcapng) or text file; `-` for stdin
    input: Option<PathBuf>,

    /// Device list: one `identifier [name]` per line
    #[arg(long)]
    devices: Option<PathBuf>,

    /// Register identifiers not found in the device list instead of dropping their messages
    #[arg(long)]
    accept_unknown: bool,

    /// Transport assumed for text input
    #[arg(long, value_enum, default_value = "udp")]
    transport: TransportArg,

    /// Sender address assumed for text input (acks are addressed to it)
    #[arg(long, default_value = "127.0.0.1:5000")]
    remote: SocketAddr,

    /// Print records as JSON lines
    #[arg(long)]
    json: bool,

    /// Print acks and debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Stats {
    packets: u64,
    segments: u64,
    messages: u64,
    decoded: u64,
    mismatched: u64,
    unknown_devices: u64,
    field_errors: u64,
    malformed: u64,
    acks: u64,
}

struct Session {
    decoder: Decoder<DeviceRegistry>,
    json: bool,
    verbose: bool,
    stats: Stats,
    out: io::StdoutLock<'static>,
}

impl Session {
    fn process(&mut self, payload: &[u8], transport: &Transport) -> anyhow::Result<()> {
        let mut acks: Vec<AckReply> = Vec::new();
        let result = decode_batch(&self.decoder, payload, transport, &mut acks);
        self.stats.acks += acks.len() as u64;
        if self.verbose {
            for ack in &acks {
                eprintln!("ack -> {}: {}", ack.destination, ack);
            }
        }
        self.record(result)
    }

    fn record(&mut self, result: BatchResult) -> anyhow::Result<()> {
        self.stats.messages += result.len() as u64;
        self.stats.decoded += result.decoded.len() as u64;
        for rejected in &result.rejected {
            match &rejected.reason {
                Rejection::Decode(DecodeError::GrammarMismatch) => self.stats.mismatched += 1,
                Rejection::Decode(DecodeError::UnknownDevice(_)) => self.stats.unknown_devices += 1,
                Rejection::Decode(DecodeError::Field(_)) => self.stats.field_errors += 1,
                Rejection::Oversized | Rejection::NotUtf8 => self.stats.malformed += 1,
            }
            debug!(
                "rejected bytes [{}-{}]: {}",
                rejected.byte_range.0, rejected.byte_range.1, rejected.reason
            );
        }
        for msg in &result.decoded {
            if self.json {
                serde_json::to_writer(&mut self.out, &msg.record)?;
                writeln!(self.out)?;
            } else {
                writeln!(self.out, "=== record bytes [{}-{}] ===", msg.byte_range.0, msg.byte_range.1)?;
                write!(self.out, "{}", format_record(&msg.record, 1))?;
            }
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let registry = match &args.devices {
        Some(path) => {
            let registry = DeviceRegistry::load(path)?;
            info!("loaded {} device(s) from {}", registry.len(), path.display());
            registry
        }
        None => DeviceRegistry::new(),
    }
    .accept_unknown(args.accept_unknown);

    let mut session = Session {
        decoder: Decoder::new(registry),
        json: args.json,
        verbose: args.verbose,
        stats: Stats::default(),
        out: io::stdout().lock(),
    };

    let input = args.input.clone().filter(|p| p.as_os_str() != "-");
    let text_transport = match args.transport {
        TransportArg::Udp => Transport::Datagram { remote: args.remote },
        TransportArg::Tcp => Transport::Stream {
            remote: Some(args.remote),
        },
    };

    match input {
        None => run_text(io::stdin().lock(), &mut session, &text_transport)?,
        Some(path) => {
            // Probe file type (pcap, pcapng or text) using the magic at start of file.
            let mut probe = [0u8; 4];
            let n = File::open(&path)?.read(&mut probe)?;
            let file = File::open(&path)?;
            match &probe[..n] {
                [0x0a, 0x0d, 0x0d, 0x0a] => run_pcapng(file, &mut session)?,
                [0xd4, 0xc3, 0xb2, 0xa1] | [0xa1, 0xb2, 0xc3, 0xd4]
                | [0x4d, 0x3c, 0xb2, 0xa1] | [0xa1, 0xb2, 0x3c, 0x4d] => {
                    run_legacy_pcap(file, &mut session)?
                }
                _ => run_text(BufReader::new(file), &mut session, &text_transport)?,
            }
            eprintln!("input: {}", path.display());
        }
    }

    let s = &session.stats;
    if s.packets > 0 {
        eprintln!("packets: {}", s.packets);
        eprintln!("tcp/udp payloads: {}", s.segments);
    }
    eprintln!("messages: {}", s.messages);
    eprintln!("decoded records: {}", s.decoded);
    eprintln!("not esky (grammar mismatch): {}", s.mismatched);
    eprintln!("unknown devices: {}", s.unknown_devices);
    eprintln!("field errors: {}", s.field_errors);
    eprintln!("malformed (oversized / not UTF-8): {}", s.malformed);
    eprintln!("acks: {}", s.acks);
    Ok(())
}

fn run_text<R: BufRead>(reader: R, session: &mut Session, transport: &Transport) -> anyhow::Result<()> {
    for line in reader.split(b'\n') {
        let line = line?;
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }
        session.process(&line, transport)?;
    }
    Ok(())
}

fn process_frame(session: &mut Session, linktype: Linktype, frame: &[u8]) -> anyhow::Result<()> {
    session.stats.packets += 1;
    if let Some(segment) = segment_from_linktype(linktype, frame) {
        if segment.payload.is_empty() {
            return Ok(());
        }
        session.stats.segments += 1;
        session.process(segment.payload, &segment.transport())?;
    }
    Ok(())
}

fn run_legacy_pcap<R: Read>(file: R, session: &mut Session) -> anyhow::Result<()> {
    let mut reader = pcap_parser::pcap::LegacyPcapReader::new(1 << 20, file)?;
    let mut linktype: Option<Linktype> = None;
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                match block {
                    PcapBlockOwned::LegacyHeader(h) => linktype = Some(h.network),
                    PcapBlockOwned::Legacy(b) => {
                        let lt = linktype.unwrap_or(Linktype(1));
                        process_frame(session, lt, b.data)?;
                    }
                    PcapBlockOwned::NG(_) => {}
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| anyhow::anyhow!("pcap refill error: {:?}", e))?;
            }
            Err(e) => return Err(anyhow::anyhow!("pcap read error: {:?}", e)),
        }
    }
    Ok(())
}

fn run_pcapng<R: Read>(file: R, session: &mut Session) -> anyhow::Result<()> {
    let mut reader = pcap_parser::pcapng::PcapNGReader::new(1 << 20, file)?;
    let mut if_linktypes: Vec<Linktype> = Vec::new();
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                if let PcapBlockOwned::NG(b) = block {
                    match &b {
                        PcapNgBlock::InterfaceDescription(idb) => if_linktypes.push(idb.linktype),
                        PcapNgBlock::EnhancedPacket(epb) => {
                            let lt = if_linktypes.get(epb.if_id as usize).copied().unwrap_or(Linktype(1));
                            process_frame(session, lt, epb.packet_data())?;
                        }
                        PcapNgBlock::SimplePacket(spb) => {
                            let lt = if_linktypes.first().copied().unwrap_or(Linktype(1));
                            process_frame(session, lt, spb.packet_data())?;
                        }
                        _ => {}
                    }
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| anyhow::anyhow!("pcapng refill error: {:?}", e))?;
            }
            Err(e) => return Err(anyhow::anyhow!("pcapng read error: {:?}", e)),
        }
    }
    Ok(())
}
