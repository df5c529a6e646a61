//! plot-phase1 - Forward propagation phase of proof-of-space plotting
//!
//! Computes table 1 from a ChaCha8 keystream keyed by the plot id, then
//! derives tables 2 to 7 by matching entries of adjacent sorted buckets and
//! mixing each matched pair through BLAKE3. Sorting, disk I/O and the later
//! phases live outside this crate and plug in through [`sink::EntrySink`]
//! and plain iterators of sorted blocks.

pub mod bits;
pub mod config;
pub mod entry;
pub mod error;
pub mod f1;
pub mod fx;
pub mod matcher;
/// In-memory driver for small plots
pub mod memory;
pub mod phase1;
pub mod sink;
pub mod targets;

pub use config::Phase1Config;
pub use entry::{ParentEntry, PlotId, PositionEntry, Table1Entry, TableEntry};
pub use error::{Phase1Error, Result};
pub use phase1::{compute_f1, compute_matches};
