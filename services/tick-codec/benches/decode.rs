// Decode-path benchmarks: inflate, unpack and reconstruct one day of ticks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lob_types::tick::{TickRecord, RECORD_WIDTH};
use tick_codec::{decode_absolute, encode_absolute, Compression, Decompressor};

// One trading day at a 3 s cadence
const RECORDS_PER_DAY: usize = 4_800;

fn trading_day(records: usize) -> Vec<TickRecord> {
    (0..records)
        .map(|i| {
            let drift = ((i * 7) % 11) as i16 - 5;
            let price = 1_000 + drift;
            TickRecord {
                day: 3,
                time_s: 34_200 + (i as u16).wrapping_mul(3),
                price_tick: price,
                trade_count: (i % 5) as u8,
                turnover: (i as u32 % 50) * price as u32,
                volume: (i % 50) as u16,
                bid_price_ticks: std::array::from_fn(|l| price - 1 - l as i16),
                bid_volumes: std::array::from_fn(|l| 100 + l as u16),
                ask_price_ticks: std::array::from_fn(|l| price + 1 + l as i16),
                ask_volumes: std::array::from_fn(|l| 120 + l as u16),
                direction: (i % 2) as u8,
                ..Default::default()
            }
        })
        .collect()
}

fn bench_decode_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_file");

    for compression in [Compression::Zlib, Compression::Zstd] {
        let records = trading_day(RECORDS_PER_DAY);
        let packed = encode_absolute(&records, compression).expect("compress");
        let decompressor = Decompressor::new(compression);
        group.throughput(Throughput::Bytes((RECORDS_PER_DAY * RECORD_WIDTH) as u64));

        group.bench_with_input(
            BenchmarkId::new("hinted", compression.name()),
            &packed,
            |b, packed| {
                b.iter(|| {
                    let raw = decompressor
                        .inflate(black_box(packed), Some(RECORDS_PER_DAY))
                        .expect("inflate");
                    decode_absolute(&raw).expect("decode")
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("adaptive", compression.name()),
            &packed,
            |b, packed| {
                b.iter(|| decompressor.inflate(black_box(packed), None))
            },
        );
    }

    group.finish();
}

criterion_group!(decode_benches, bench_decode_file);
criterion_main!(decode_benches);
