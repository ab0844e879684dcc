//! Benchmarks for CourierKV call round-trips

use criterion::{criterion_group, criterion_main, Criterion};

use courierkv::{CallOptions, KvClient, KvPair, KvServer, Transport, TransportConfig};

fn call_benchmarks(c: &mut Criterion) {
    let endpoint = KvServer::bind("127.0.0.1:0").unwrap().start().unwrap();
    let transport = Transport::new(TransportConfig::default()).unwrap();
    let client = KvClient::bound(transport, endpoint);
    let opts = CallOptions::default();

    client
        .write_sync(&KvPair::new("bench", "payload"), &opts)
        .unwrap();

    c.bench_function("read_sync round trip", |b| {
        b.iter(|| client.read_sync("bench", &opts).unwrap())
    });

    c.bench_function("write_sync round trip", |b| {
        b.iter(|| client.write_sync(&KvPair::new("bench", "payload"), &opts).unwrap())
    });

    c.bench_function("ping round trip", |b| {
        b.iter(|| client.ping(&opts).unwrap())
    });
}

criterion_group!(benches, call_benchmarks);
criterion_main!(benches);
