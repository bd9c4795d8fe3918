//! Decoder fuzz target: feed arbitrary bytes to the batch decoder over both transports.
//! Decoding must not panic; every message ends up decoded or rejected.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    use esky_decoder::frame::decode_batch;
    use esky_decoder::{Decoder, DeviceRegistry, Transport};

    let decoder = Decoder::new(DeviceRegistry::new().accept_unknown(true));
    let udp = Transport::Datagram {
        remote: std::net::SocketAddr::from(([127, 0, 0, 1], 5000)),
    };
    let mut acks = Vec::new();
    let _ = decode_batch(&decoder, data, &udp, &mut acks);
    let _ = decode_batch(&decoder, data, &Transport::Stream { remote: None }, &mut acks);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
