/*
This benchmark measures the per-cycle payload cost: generating one reading
(random measurement + wall-clock timestamp) and serializing it to the JSON
body the emitters POST. The HTTP round trip dominates a real cycle; this
isolates the part the generator itself owns.
*/

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use std::hint::black_box;

use sensor_loadgen::emitter::reading::{SensorKind, SensorReading};

fn bench_payload_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_construction");

    for kind in [SensorKind::Temperatura, SensorKind::Ph, SensorKind::Oxigeno] {
        group.bench_function(BenchmarkId::new("generate_and_serialize", kind.tag()), |b| {
            b.iter(|| {
                let reading = SensorReading::generate(kind);
                let body = serde_json::to_vec(&reading).expect("serialization cannot fail");
                black_box(body);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_payload_construction);
criterion_main!(benches);
