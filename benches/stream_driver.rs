//! Criterion benchmarks for the timestamping hot path.
//!
//! A Percept streaming session runs at 250-1000 Hz across up to six channels for hours,
//! so per-record cost of the stream driver dominates offline reprocessing time.
//!
//! Key metrics:
//! - Records per second through `StreamDriver::stream` for different channel counts
//! - Cost of `process_packet` alone (clock + rate update, no record emission)
//!
//! Run with: cargo bench --bench stream_driver

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use percept_daq::timing::{StreamDriver, StreamOptions};
use percept_daq::{DeviceSettings, Packet};

const PACKETS: u32 = 1_000;
const SAMPLES_PER_PACKET: usize = 62;

fn make_packets(channels: usize) -> Vec<Packet> {
    (0..PACKETS)
        .map(|i| {
            let elapsed = (i + 1) * 2_480;
            Packet {
                unit: "microvolts".to_string(),
                rate_code: 0,
                sequence: i,
                device_timestamp: (f64::from(elapsed) * 0.0001).floor(),
                tick: (elapsed % 65_536) as u16,
                channels: vec![vec![1.0; SAMPLES_PER_PACKET]; channels],
            }
        })
        .collect()
}

/// Benchmark full record emission for a typical session.
fn stream_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_records");

    for channels in [1usize, 2, 6] {
        let packets = make_packets(channels);
        let records = u64::from(PACKETS) * (SAMPLES_PER_PACKET * channels) as u64;

        group.throughput(Throughput::Elements(records));
        group.bench_with_input(BenchmarkId::new("channels", channels), &packets, |b, packets| {
            b.iter(|| {
                let driver = StreamDriver::new(DeviceSettings::default(), StreamOptions::default());
                let sum: f64 = driver
                    .stream(packets.iter().cloned().map(Ok))
                    .map(|r| r.map(|r| r.timestamp).unwrap_or(0.0))
                    .sum();
                black_box(sum);
            });
        });
    }

    group.finish();
}

/// Benchmark the per-packet state update without iterating records.
fn packet_update(c: &mut Criterion) {
    let packets = make_packets(2);

    c.bench_function("process_packet", |b| {
        b.iter(|| {
            let mut driver = StreamDriver::new(DeviceSettings::default(), StreamOptions::default());
            for packet in packets.iter().cloned() {
                black_box(driver.process_packet(packet).ok());
            }
        });
    });
}

criterion_group!(benches, stream_throughput, packet_update);
criterion_main!(benches);
