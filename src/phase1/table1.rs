//! Table 1 generation
//!
//! The domain `[0, 2^k)` is cut into batches of keystream blocks; a rayon
//! pool computes batches in parallel and a single sink thread hands them to
//! the output in completion order. The output sorts them later.

use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::config::{Phase1Config, ENTRIES_PER_BLOCK};
use crate::entry::{PlotId, Table1Entry};
use crate::error::{Phase1Error, Result};
use crate::f1::F1Calculator;
use crate::sink::EntrySink;

/// Keystream blocks per work item
pub const F1_BATCH_BLOCKS: u64 = 4096;

/// Produce every table 1 entry into `output` and finish it.
///
/// Returns the number of entries written, always `2^k`.
pub fn compute_f1<S>(config: &Phase1Config, id: &PlotId, output: &mut S) -> Result<u64>
where
    S: EntrySink<Table1Entry> + ?Sized,
{
    config.validate()?;

    let num_blocks = config.num_f1_blocks();
    let batch_blocks = F1_BATCH_BLOCKS.min(num_blocks);
    let num_batches = num_blocks.div_ceil(batch_blocks);

    info!(
        "phase 1 table 1: {} entries in {} batches, {} threads",
        num_blocks * ENTRIES_PER_BLOCK,
        num_batches,
        config.num_threads
    );
    let start_time = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .thread_name(|i| format!("phase1/F1-{}", i))
        .build()?;

    let written = thread::scope(|s| -> Result<u64> {
        let (tx, rx) = mpsc::sync_channel::<Vec<Table1Entry>>(config.queue_depth);

        let sink = &mut *output;
        let sink_thread = thread::Builder::new()
            .name("phase1/F1-sink".to_string())
            .spawn_scoped(s, move || {
                let mut written = 0u64;
                for batch in rx {
                    written += batch.len() as u64;
                    sink.add_block(batch);
                }
                written
            })?;

        pool.install(|| {
            (0..num_batches)
                .into_par_iter()
                .for_each_with(tx, |tx, batch| {
                    let first = batch * batch_blocks;
                    let count = batch_blocks.min(num_blocks - first);
                    let mut f1 = F1Calculator::new(config, id);
                    let mut out = Vec::new();
                    f1.generate_blocks(first, count, &mut out);
                    // Only fails if the sink thread died; its join reports that
                    let _ = tx.send(out);
                });
        });

        sink_thread
            .join()
            .map_err(|_| Phase1Error::WorkerPanicked("phase1/F1-sink"))
    })?;

    output.finish()?;

    info!(
        "phase 1 table 1: {} entries in {:.1}s",
        written,
        start_time.elapsed().as_secs_f64()
    );
    Ok(written)
}
