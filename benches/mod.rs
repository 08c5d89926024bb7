use criterion::{criterion_group, criterion_main};

mod network;

criterion_group!(
    benches,
    sensor::bench_convert_all_codes,
    telemetry::bench_format,
    telemetry::bench_parse_payload,
    network::mqtt::bench_publish,
    network::mqtt::bench_service_idle
);
criterion_main!(benches);
