//! In-memory driver
//!
//! Chains table 1 and the six matching passes with a rayon sort standing in
//! for the external sort engine. Everything stays resident, so this is for
//! small `k` (tests, benchmarks, quick checks of a parameter set).

use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::config::Phase1Config;
use crate::entry::{ParentEntry, PlotId, Table1Entry, TableEntry};
use crate::error::Result;
use crate::phase1::{compute_f1, compute_matches};
use crate::sink::VecSink;

/// Entries handed to a pass per input block
pub const MEMORY_BLOCK_ENTRIES: usize = 64 * 1024;

/// All seven tables, each sorted by `y`
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub table1: Vec<Table1Entry>,
    /// Tables 2 to 7, in order
    pub tables: Vec<Vec<TableEntry>>,
    /// Matches found by each pass, tables 2 to 7
    pub matches: Vec<u64>,
}

impl Tables {
    /// Table `index` (2..=7)
    pub fn table(&self, index: u8) -> Option<&[TableEntry]> {
        let slot = usize::from(index).checked_sub(2)?;
        self.tables.get(slot).map(Vec::as_slice)
    }
}

pub fn build_tables(config: &Phase1Config, id: &PlotId) -> Result<Tables> {
    config.validate()?;
    let start_time = Instant::now();

    let mut sink = VecSink::with_capacity(1usize << config.k);
    compute_f1(config, id, &mut sink)?;
    let mut table1 = sink.into_inner();
    table1.par_sort_unstable_by_key(|e| (e.y, e.x));

    let mut tables = Vec::with_capacity(6);
    let mut matches = Vec::with_capacity(6);

    let (table2, found) = run_pass(config, 2, &table1)?;
    tables.push(table2);
    matches.push(found);
    for table_index in 3..=7u8 {
        let (next, found) = run_pass(config, table_index, &tables[tables.len() - 1])?;
        tables.push(next);
        matches.push(found);
    }

    info!(
        "phase 1 in memory: k = {}, table sizes {:?} in {:.1}s",
        config.k,
        tables.iter().map(Vec::len).collect::<Vec<_>>(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(Tables {
        table1,
        tables,
        matches,
    })
}

/// One pass over a sorted parent table; the result is sorted by `y`, ties
/// broken by parent positions so repeated runs agree exactly.
pub fn run_pass<T: ParentEntry>(
    config: &Phase1Config,
    table_index: u8,
    parents: &[T],
) -> Result<(Vec<TableEntry>, u64)> {
    let mut sink = VecSink::with_capacity(parents.len());
    let blocks = parents.chunks(MEMORY_BLOCK_ENTRIES).map(<[T]>::to_vec);
    let found = compute_matches(config, table_index, blocks, &mut sink, None)?;
    let mut entries = sink.into_inner();
    entries.par_sort_unstable_by_key(|e| (e.y, e.pos, e.off));
    Ok((entries, found))
}
