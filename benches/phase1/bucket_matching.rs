//! Bucket matching benchmark
//!
//! Two adjacent buckets of random `y` values at the sizes a k = 32 plot sees
//! (about 4,700 entries per bucket on average), plus the full pass over a
//! small in-memory table 1.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use plot_phase1::matcher::{Bucket, BucketMatcher};
use plot_phase1::memory::run_pass;
use plot_phase1::sink::VecSink;
use plot_phase1::targets::TargetTable;
use plot_phase1::{compute_f1, Phase1Config, PlotId, Table1Entry};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sorted bucket of `len` random entries with index `index`
fn random_bucket(rng: &mut StdRng, bc: u64, index: u64, len: usize) -> Bucket<Table1Entry> {
    let mut ys: Vec<u64> = (0..len)
        .map(|_| index * bc + rng.gen_range(0..bc))
        .collect();
    ys.sort_unstable();
    let mut bucket = Bucket::new(index, index * len as u64);
    bucket.entries = ys
        .into_iter()
        .enumerate()
        .map(|(x, y)| Table1Entry { x: x as u32, y })
        .collect();
    bucket
}

fn benchmark_match_buckets(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_buckets");
    let config = Phase1Config::default();
    let bc = u64::from(config.bc());
    let targets = Arc::new(TargetTable::new(&config));
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for bucket_len in [1000, 4700, 10000] {
        let left = random_bucket(&mut rng, bc, 100, bucket_len);
        let right = random_bucket(&mut rng, bc, 101, bucket_len);
        let mut matcher = BucketMatcher::new(Arc::clone(&targets));

        group.bench_with_input(
            BenchmarkId::new("match_buckets", format!("{}entries", bucket_len)),
            &(left, right),
            |b, (left, right)| b.iter(|| black_box(matcher.match_buckets(left, right))),
        );
    }
    group.finish();
}

fn benchmark_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching_pass");
    group.sample_size(10);
    let id = PlotId([7u8; 32]);

    for k in [14u8, 16] {
        let config = Phase1Config {
            k,
            ..Default::default()
        };
        let mut sink = VecSink::new();
        compute_f1(&config, &id, &mut sink).unwrap();
        let mut table1 = sink.into_inner();
        table1.sort_unstable_by_key(|e| (e.y, e.x));

        group.bench_with_input(BenchmarkId::new("table2", format!("k{}", k)), &table1, |b, table1| {
            b.iter(|| black_box(run_pass(&config, 2, table1).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_match_buckets, benchmark_pass);
criterion_main!(benches);
