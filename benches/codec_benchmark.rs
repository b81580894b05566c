use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fieldseal::{derive_key, envelope};
use serde_json::Value;

fn benchmark_key_derivation(c: &mut Criterion) {
    // The deliberately expensive operation the cache exists to amortise.
    c.bench_function("derive_key", |b| {
        b.iter(|| derive_key(black_box("bench-user")).unwrap())
    });
}

fn benchmark_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");

    let key = derive_key("bench-user").unwrap();

    // Payload sizes spanning a short name field up to a long notes field.
    let sizes = [("100B", 100), ("1KB", 1024), ("10KB", 10 * 1024)];

    for (name, size) in sizes {
        let value = Value::String("x".repeat(size));
        let sealed = envelope::seal(&key, &value).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("seal", name), &value, |b, value| {
            b.iter(|| envelope::seal(black_box(&key), black_box(value)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("open", name), &sealed, |b, sealed| {
            b.iter(|| envelope::open(black_box(&key), black_box(sealed)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_key_derivation, benchmark_envelope);
criterion_main!(benches);
