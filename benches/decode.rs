//! Benchmark: grammar match alone vs full decode, with and without the extension group,
//! plus a stream payload of many messages through decode_batch.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use esky_decoder::frame::decode_batch;
use esky_decoder::{Decoder, DeviceRegistry, MessageGrammar, Transport};

const FULL: &str =
    "ET;1;863070021234567;R;9+210101153045+12.345678+-98.765432+0.50+90+0x3+1+12345+12600";
const SHORT: &str = "ET;2;863070021234567;R;6+190317162511+60.26922+25.16030+0.00+0+4062";

fn bench_decode(c: &mut Criterion) {
    let registry = DeviceRegistry::new();
    registry.register("863070021234567", None);
    let decoder = Decoder::new(registry);
    let udp = Transport::Datagram {
        remote: "127.0.0.1:5000".parse().expect("addr"),
    };
    let tcp = Transport::Stream { remote: None };

    c.bench_function("match_full", |b| {
        b.iter(|| MessageGrammar::shared().matches(black_box(FULL)).map(|c| c.len()))
    });
    c.bench_function("decode_full_udp", |b| {
        let mut acks = Vec::with_capacity(1);
        b.iter(|| {
            acks.clear();
            decoder.decode(black_box(FULL), &udp, &mut acks).is_ok()
        })
    });
    c.bench_function("decode_short_tcp", |b| {
        b.iter(|| decoder.decode(black_box(SHORT), &tcp, &mut ()).is_ok())
    });

    let mut payload = String::new();
    for i in 0..256 {
        payload.push_str(if i % 2 == 0 { FULL } else { SHORT });
        payload.push_str("\r\n");
    }
    c.bench_function("decode_batch_256", |b| {
        b.iter(|| decode_batch(&decoder, black_box(payload.as_bytes()), &tcp, &mut ()).decoded.len())
    });
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
