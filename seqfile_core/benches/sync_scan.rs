//! Benchmarks the resynchronization scan (`Reader::sync`) at a handful of
//! file sizes and landing offsets. The teacher's benches exercise
//! block-random-access throughput directly; this format's random access is
//! sync-based rather than index-based, so the analogous thing to measure is
//! how long a reader dropped at an arbitrary byte offset takes to find the
//! next record boundary.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use seqfile_codecs::{DefaultCodec, KnownCodecs};
use seqfile_core::{ClassRegistry, CompressionType, IntWritable, Reader, Text, Writer, WriterOptions};

fn write_corpus(records: u64) -> Vec<u8> {
    let options = WriterOptions::default()
        .compression(CompressionType::Block)
        .codec(Arc::new(DefaultCodec::default()))
        .compression_block_size(20_000);
    let mut writer =
        Writer::new(Vec::new(), "io.IntWritable", "io.Text", options).expect("writer");
    for i in 0..records as i32 {
        writer
            .append(&IntWritable(i), &Text::new(i.to_string()))
            .expect("append");
    }
    writer.close_into_inner().expect("close")
}

fn bench_sync_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_scan");

    for &records in &[1_000u64, 10_000, 100_000] {
        let corpus = write_corpus(records);
        group.throughput(Throughput::Bytes(corpus.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("resync_at_midpoint", records),
            &corpus,
            |b, corpus| {
                let classes = ClassRegistry::default();
                let codecs = KnownCodecs;
                let midpoint = corpus.len() as u64 / 2;
                b.iter(|| {
                    let mut reader =
                        Reader::from_stream(std::io::Cursor::new(corpus.clone()), corpus.len() as u64, &classes, &codecs)
                            .expect("open");
                    reader.sync(black_box(midpoint)).expect("sync");
                    black_box(reader.iter().count());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_sync_scan);
criterion_main!(benches);
