//! End-to-end tests of the table 1 generator and the matching pass

use plot_phase1::phase1::compute_matches_with_stats;
use plot_phase1::sink::{EntrySink, NullSink, VecSink};
use plot_phase1::{
    compute_f1, compute_matches, Phase1Config, Phase1Error, PositionEntry, Table1Entry, TableEntry,
};

use super::helpers::*;

#[test]
fn test_compute_f1_covers_domain() {
    let config = small_config(12, 3);
    let id = test_id();
    let mut sink = VecSink::new();
    let written = compute_f1(&config, &id, &mut sink).unwrap();
    assert_eq!(written, 1 << 12);
    assert!(sink.finished());

    let mut entries = sink.into_inner();
    entries.sort_unstable_by_key(|e| e.x);
    let xs: Vec<u32> = entries.iter().map(|e| e.x).collect();
    assert_eq!(xs, (0..1u32 << 12).collect::<Vec<_>>());

    // Same values as computing each block directly
    entries.sort_unstable_by_key(|e| (e.y, e.x));
    assert_eq!(entries, sorted_table1(&config, &id));
}

#[test]
fn test_compute_f1_batches_larger_domain() {
    // 2^17 entries = 8192 blocks = two full batches
    let config = small_config(17, 4);
    let mut sink = NullSink::default();
    let written = compute_f1(&config, &test_id(), &mut sink).unwrap();
    assert_eq!(written, 1 << 17);
    assert_eq!(sink.count, 1 << 17);
    assert!(sink.finished);
}

#[test]
fn test_pass_count_matches_brute_force() {
    let config = small_config(10, 4);
    let table1 = sorted_table1(&config, &test_id());
    let expected = brute_force_matches(&config, &table1);
    assert!(expected > 0);

    let mut sink = VecSink::new();
    let found = compute_matches(&config, 2, blocks(&table1, 100), &mut sink, None).unwrap();
    assert_eq!(found, expected);
    assert_eq!(sink.len() as u64, found);
    assert!(sink.finished());
    assert_children_consistent(&config, 2, &table1, sink.entries());
}

#[test]
fn test_pass_stats() {
    let config = small_config(10, 2);
    let table1 = sorted_table1(&config, &test_id());
    let bc = u64::from(config.bc());
    let mut indices: Vec<u64> = table1.iter().map(|e| e.y / bc).collect();
    indices.dedup();

    let mut sink = NullSink::default();
    let stats = compute_matches_with_stats(&config, 2, blocks(&table1, 333), &mut sink, None)
        .unwrap();
    assert_eq!(stats.parents, table1.len() as u64);
    assert_eq!(stats.buckets, indices.len() as u64);
    let adjacent = indices.windows(2).filter(|w| w[0] + 1 == w[1]).count() as u64;
    assert_eq!(stats.bucket_pairs, adjacent);
    assert_eq!(stats.matches, sink.count);
}

#[test]
fn test_pass_independent_of_threads_and_blocks() {
    let id = test_id();
    let single = small_config(11, 1);
    let table1 = sorted_table1(&single, &id);

    let mut a = VecSink::new();
    compute_matches(&single, 2, blocks(&table1, table1.len()), &mut a, None).unwrap();
    let mut b = VecSink::new();
    compute_matches(&small_config(11, 6), 2, blocks(&table1, 7), &mut b, None).unwrap();

    let mut a = a.into_inner();
    let mut b = b.into_inner();
    a.sort_unstable_by_key(|e| (e.pos, e.off));
    b.sort_unstable_by_key(|e| (e.pos, e.off));
    assert_eq!(a, b);
}

#[test]
fn test_later_table_pass() {
    let config = small_config(10, 3);
    let table1 = sorted_table1(&config, &test_id());
    let mut sink = VecSink::new();
    compute_matches(&config, 2, blocks(&table1, 256), &mut sink, None).unwrap();
    let table2 = sink.into_sorted_by_key(|e| (e.y, e.pos, e.off));

    let expected = brute_force_matches(&config, &table2);
    let mut sink = VecSink::new();
    let found = compute_matches(&config, 3, blocks(&table2, 64), &mut sink, None).unwrap();
    assert_eq!(found, expected);
    assert_children_consistent(&config, 3, &table2, sink.entries());
}

#[test]
fn test_empty_input() {
    let config = small_config(10, 2);
    let mut sink = VecSink::new();
    let found = compute_matches::<Table1Entry, _, _>(&config, 2, Vec::new(), &mut sink, None)
        .unwrap();
    assert_eq!(found, 0);
    assert!(sink.is_empty());
    assert!(sink.finished());
}

#[test]
fn test_no_adjacent_buckets() {
    let config = small_config(10, 2);
    let bc = u64::from(config.bc());
    let table1: Vec<Table1Entry> = [0, 1, 2 * bc, 2 * bc + 5, 4 * bc]
        .iter()
        .enumerate()
        .map(|(x, &y)| Table1Entry { x: x as u32, y })
        .collect();
    let mut sink = VecSink::new();
    let found = compute_matches(&config, 2, blocks(&table1, 2), &mut sink, None).unwrap();
    assert_eq!(found, 0);
    assert!(sink.finished());
}

#[test]
fn test_unsorted_input_aborts() {
    let config = small_config(10, 2);
    let mut table1 = sorted_table1(&config, &test_id());
    let bc = u64::from(config.bc());
    // Move one entry of bucket 0 behind bucket 2
    let late = table1.remove(0);
    let pos = table1.iter().position(|e| e.y / bc == 3).unwrap();
    table1.insert(pos, late);

    let mut sink = VecSink::new();
    let err = compute_matches(&config, 2, blocks(&table1, 50), &mut sink, None).unwrap_err();
    match err {
        Phase1Error::UnsortedInput { index, current, position } => {
            assert_eq!(index, 0);
            assert_eq!(current, 2);
            assert_eq!(position, pos as u64);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!sink.finished());
}

#[test]
fn test_tee_receives_every_parent() {
    let config = small_config(10, 2);
    let table1 = sorted_table1(&config, &test_id());
    let mut tee = VecSink::new();
    let mut sink = NullSink::default();
    compute_matches(
        &config,
        2,
        blocks(&table1, 100),
        &mut sink,
        Some(&mut tee as &mut dyn EntrySink<Table1Entry>),
    )
    .unwrap();
    assert_eq!(tee.into_inner(), table1);

    let table2 = vec![
        TableEntry { y: 5, pos: 1, off: 2, meta: 99 },
        TableEntry { y: 6, pos: 3, off: 4, meta: 98 },
    ];
    let mut tee = VecSink::new();
    compute_matches(
        &config,
        3,
        vec![table2],
        &mut NullSink::default(),
        Some(&mut tee as &mut dyn EntrySink<PositionEntry>),
    )
    .unwrap();
    assert_eq!(
        tee.into_inner(),
        vec![
            PositionEntry { y: 5, pos: 1, off: 2 },
            PositionEntry { y: 6, pos: 3, off: 4 },
        ]
    );
}

#[test]
fn test_configuration_errors_fail_fast() {
    let config = small_config(10, 2);
    let mut sink = VecSink::new();
    let err = compute_matches::<Table1Entry, _, _>(&config, 8, Vec::new(), &mut sink, None)
        .unwrap_err();
    assert!(matches!(err, Phase1Error::InvalidTable(8)));
    assert!(!sink.finished());

    let bad = Phase1Config { num_threads: 0, ..config };
    let err = compute_f1(&bad, &test_id(), &mut VecSink::new()).unwrap_err();
    assert!(matches!(err, Phase1Error::Config(_)));
}

#[test]
fn test_sink_failure_is_reported() {
    struct FailingSink;
    impl EntrySink<TableEntry> for FailingSink {
        fn add(&mut self, _entry: TableEntry) {}
        fn finish(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    let config = small_config(10, 2);
    let table1 = sorted_table1(&config, &test_id());
    let err = compute_matches(&config, 2, blocks(&table1, 100), &mut FailingSink, None)
        .unwrap_err();
    assert!(matches!(err, Phase1Error::Sink(_)));
}
