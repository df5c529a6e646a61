//! Forward Propagation
//!
//! Builds the seven tables one pass at a time. Sorting and persistence
//! belong to the caller's sort engine; this module only consumes sorted
//! streams and fills unordered sinks.
//!
//! ## Strategy
//!
//! 1. **Table 1**: ChaCha8 keystream over the whole `x` domain, computed in
//!    parallel batches, written unordered
//! 2. **Sort**: external, by `y`
//! 3. **Scan**: one sequential pass groups the sorted stream into buckets of
//!    equal `y / BC` and pairs up adjacent buckets
//! 4. **Match**: a worker pool runs the bucket matcher on each pair
//! 5. **Evaluate**: a single thread applies the table function to every
//!    match and writes table `t` unordered
//! 6. Repeat 2-5 for tables 2 to 7
//!
//! ## Memory Usage
//!
//! At most two sealed buckets per queued pair are alive at once; everything
//! else streams through bounded queues.

pub mod matches;
pub mod scan;
pub mod table1;

pub use matches::{compute_matches, compute_matches_with_stats, PassStats};
pub use scan::{BucketPair, BucketScanner};
pub use table1::{compute_f1, F1_BATCH_BLOCKS};
