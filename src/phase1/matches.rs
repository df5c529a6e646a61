//! One matching pass: table `t - 1` entries in, table `t` entries out
//!
//! ```text
//! sorted blocks ──> scan (this thread) ──> match workers ──> F{t} thread ──> sink
//!                   │                      (one BucketMatcher each)
//!                   └──> tee (optional)
//! ```
//!
//! The scan is the only stage that sees stream order, so it assigns `pos`
//! and bucket offsets before work leaves this thread. Workers and the
//! evaluation thread may then run in any order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::config::Phase1Config;
use crate::entry::{ParentEntry, TableEntry};
use crate::error::{Phase1Error, Result};
use crate::fx::FxCalculator;
use crate::matcher::{BucketMatcher, Match};
use crate::phase1::scan::{BucketPair, BucketScanner};
use crate::sink::EntrySink;
use crate::targets::TargetTable;

/// Counters for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub parents: u64,
    pub buckets: u64,
    pub bucket_pairs: u64,
    pub matches: u64,
}

/// Run one matching pass and return the number of matches found.
///
/// `input` must yield parent entries sorted by `y`. Every child goes to
/// `output`, which is finished once all of them were added. `tee`, when
/// given, receives the carried-forward form of every parent.
pub fn compute_matches<T, I, S>(
    config: &Phase1Config,
    table_index: u8,
    input: I,
    output: &mut S,
    tee: Option<&mut dyn EntrySink<T::Carry>>,
) -> Result<u64>
where
    T: ParentEntry,
    I: IntoIterator<Item = Vec<T>>,
    S: EntrySink<TableEntry> + ?Sized,
{
    compute_matches_with_stats(config, table_index, input, output, tee).map(|stats| stats.matches)
}

/// [`compute_matches`], reporting the full pass counters
pub fn compute_matches_with_stats<T, I, S>(
    config: &Phase1Config,
    table_index: u8,
    input: I,
    output: &mut S,
    mut tee: Option<&mut dyn EntrySink<T::Carry>>,
) -> Result<PassStats>
where
    T: ParentEntry,
    I: IntoIterator<Item = Vec<T>>,
    S: EntrySink<TableEntry> + ?Sized,
{
    config.validate()?;
    let fx = FxCalculator::new(config, table_index)?;
    // Built before any worker exists; read-only from here on
    let targets = Arc::new(TargetTable::new(config));

    info!(
        "phase 1 table {}: matching with {} threads",
        table_index, config.num_threads
    );
    let start_time = Instant::now();

    let num_found = AtomicU64::new(0);
    let abort = AtomicBool::new(false);
    let mut stats = PassStats::default();

    thread::scope(|s| -> Result<()> {
        let (work_tx, work_rx) = mpsc::sync_channel::<Vec<BucketPair<T>>>(config.queue_depth);
        let (match_tx, match_rx) = mpsc::sync_channel::<Vec<Match<T>>>(config.queue_depth);

        let sink = &mut *output;
        let fx = &fx;
        let abort = &abort;
        let num_found = &num_found;

        let eval_thread = thread::Builder::new()
            .name(format!("phase1/F{}", table_index))
            .spawn_scoped(s, move || {
                for matches in match_rx {
                    if abort.load(Ordering::Relaxed) {
                        continue;
                    }
                    for m in &matches {
                        sink.add(fx.evaluate_match(m));
                    }
                }
            })?;

        let work_rx = Arc::new(Mutex::new(work_rx));
        let mut workers = Vec::with_capacity(config.num_threads);
        for i in 0..config.num_threads {
            let work_rx = Arc::clone(&work_rx);
            let match_tx = match_tx.clone();
            let targets = Arc::clone(&targets);
            let handle = thread::Builder::new()
                .name(format!("phase1/match-{}", i))
                .spawn_scoped(s, move || {
                    match_worker(BucketMatcher::new(targets), &work_rx, &match_tx, abort, num_found)
                })?;
            workers.push(handle);
        }
        // Workers hold the only receivers now
        drop(work_rx);

        let mut scanner = BucketScanner::new(u64::from(config.bc()));
        let mut scan_result = Ok(());
        for block in input {
            if let Some(tee) = tee.as_deref_mut() {
                tee.add_block(block.iter().map(ParentEntry::carry).collect());
            }
            let mut pairs = Vec::new();
            if let Err(e) = scanner.push_block(&block, &mut pairs) {
                error!("phase 1 table {}: aborting pass: {}", table_index, e);
                abort.store(true, Ordering::Relaxed);
                scan_result = Err(e);
                break;
            }
            debug!(
                "phase 1 table {}: block of {} entries, {} bucket pairs",
                table_index,
                block.len(),
                pairs.len()
            );
            stats.bucket_pairs += pairs.len() as u64;
            if !pairs.is_empty() && work_tx.send(pairs).is_err() {
                // Every worker is gone; the join below reports why
                break;
            }
        }
        drop(work_tx);

        let mut worker_panicked = false;
        for handle in workers {
            worker_panicked |= handle.join().is_err();
        }

        stats.parents = scanner.position();
        if scan_result.is_ok() && !worker_panicked {
            let tail = scanner.finish();
            stats.buckets = scanner.sealed_buckets();
            if let Some(pair) = tail {
                stats.bucket_pairs += 1;
                let mut matcher = BucketMatcher::new(Arc::clone(&targets));
                let matches = matcher.match_buckets(&pair.left, &pair.right);
                num_found.fetch_add(matches.len() as u64, Ordering::Relaxed);
                if !matches.is_empty() {
                    // A dead consumer shows up in its join
                    let _ = match_tx.send(matches);
                }
            }
        } else {
            abort.store(true, Ordering::Relaxed);
        }
        drop(match_tx);

        let eval_panicked = eval_thread.join().is_err();

        scan_result?;
        if worker_panicked {
            return Err(Phase1Error::WorkerPanicked("phase1/match"));
        }
        if eval_panicked {
            return Err(Phase1Error::WorkerPanicked("phase1/F"));
        }
        Ok(())
    })?;

    output.finish()?;

    stats.matches = num_found.load(Ordering::Relaxed);
    info!(
        "phase 1 table {}: {} parents, {} bucket pairs, {} matches in {:.1}s",
        table_index,
        stats.parents,
        stats.bucket_pairs,
        stats.matches,
        start_time.elapsed().as_secs_f64()
    );
    Ok(stats)
}

fn match_worker<T: ParentEntry>(
    mut matcher: BucketMatcher,
    work_rx: &Mutex<Receiver<Vec<BucketPair<T>>>>,
    match_tx: &mpsc::SyncSender<Vec<Match<T>>>,
    abort: &AtomicBool,
    num_found: &AtomicU64,
) {
    loop {
        let job = match work_rx.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => return,
        };
        let Ok(pairs) = job else {
            return;
        };
        if abort.load(Ordering::Relaxed) {
            continue;
        }
        let mut out = Vec::new();
        for pair in &pairs {
            out.extend(matcher.match_buckets(&pair.left, &pair.right));
        }
        num_found.fetch_add(out.len() as u64, Ordering::Relaxed);
        if !out.is_empty() && match_tx.send(out).is_err() {
            return;
        }
    }
}

