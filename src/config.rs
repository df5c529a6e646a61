//! Phase 1 parameters
//!
//! The values are supplied from outside (plot format constants plus the
//! degree of parallelism) and validated once before any table is touched.

use serde::{Deserialize, Serialize};

use crate::error::{Phase1Error, Result};

/// Smallest `k` accepted; each keystream block yields 16 entries and small
/// domains are only useful for tests.
pub const MIN_K: u8 = 8;

/// Largest `k` supported (one 32-bit keystream word per `x`)
pub const MAX_K: u8 = 32;

/// Metadata never exceeds 16 bytes
pub const MAX_METADATA_BITS: usize = 128;

/// Entries produced by one keystream block
pub const ENTRIES_PER_BLOCK: u64 = 16;

/// Configuration for the forward propagation phase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase1Config {
    /// Bits per `x`
    pub k: u8,
    /// Extra bits appended to every `y`
    pub extra_bits: u8,
    /// Bucket-index modulus of the matching relation
    pub b: u32,
    /// Residue modulus of the matching relation
    pub c: u32,
    /// Metadata word counts, indexed by the table that consumes them
    pub vector_lens: [u8; 8],
    /// Number of matching / generation workers
    pub num_threads: usize,
    /// Depth of the bounded queues between pipeline stages
    pub queue_depth: usize,
}

impl Default for Phase1Config {
    fn default() -> Self {
        let num_threads = num_cpus::get();
        Self {
            k: 32,
            extra_bits: 6,
            b: 119,
            c: 127,
            vector_lens: [0, 0, 1, 2, 4, 4, 3, 2],
            num_threads,
            queue_depth: num_threads * 2,
        }
    }
}

impl Phase1Config {
    /// Coarse bucket modulus `B * C`
    pub fn bc(&self) -> u32 {
        self.b * self.c
    }

    /// Number of offset candidates `m` tried per left entry
    pub fn extra_bits_pow(&self) -> u32 {
        1 << self.extra_bits
    }

    /// Width of every `y`
    pub fn y_bits(&self) -> usize {
        usize::from(self.k) + usize::from(self.extra_bits)
    }

    /// Metadata width carried by entries of `table` (1..=7)
    pub fn metadata_bits(&self, table: u8) -> usize {
        match table {
            1..=6 => usize::from(self.k) * usize::from(self.vector_lens[usize::from(table) + 1]),
            _ => 0,
        }
    }

    /// Number of 16-entry keystream blocks covering `[0, 2^k)`
    pub fn num_f1_blocks(&self) -> u64 {
        (1u64 << self.k) / ENTRIES_PER_BLOCK
    }

    /// Check that the parameters are usable together
    pub fn validate(&self) -> Result<()> {
        if !(MIN_K..=MAX_K).contains(&self.k) {
            return Err(Phase1Error::config(format!(
                "k = {} is outside {}..={}",
                self.k, MIN_K, MAX_K
            )));
        }
        if self.extra_bits == 0 || self.extra_bits >= self.k {
            return Err(Phase1Error::config(format!(
                "extra_bits = {} must be in 1..{}",
                self.extra_bits, self.k
            )));
        }
        if self.b == 0 || self.c == 0 {
            return Err(Phase1Error::config("B and C must be non-zero"));
        }
        if self.b.checked_mul(self.c).is_none() {
            return Err(Phase1Error::config("B * C overflows"));
        }
        if self.extra_bits_pow() > self.b {
            return Err(Phase1Error::config(format!(
                "2^extra_bits = {} exceeds B = {}, matches would repeat",
                self.extra_bits_pow(),
                self.b
            )));
        }
        if self.metadata_bits(1) != usize::from(self.k) {
            return Err(Phase1Error::config(
                "table 1 metadata must be exactly one k-bit word (x)",
            ));
        }
        for table in 1..=7u8 {
            let bits = self.metadata_bits(table);
            if bits > MAX_METADATA_BITS {
                return Err(Phase1Error::config(format!(
                    "table {} metadata is {} bits, limit is {}",
                    table, bits, MAX_METADATA_BITS
                )));
            }
        }
        // Tables 2 and 3 keep both parents' metadata verbatim
        for table in 2..=3u8 {
            if self.metadata_bits(table) != 2 * self.metadata_bits(table - 1) {
                return Err(Phase1Error::config(format!(
                    "table {} metadata width {} is not twice the parent width {}",
                    table,
                    self.metadata_bits(table),
                    self.metadata_bits(table - 1)
                )));
            }
        }
        if self.num_threads == 0 {
            return Err(Phase1Error::config("num_threads must be at least 1"));
        }
        if self.queue_depth == 0 {
            return Err(Phase1Error::config("queue_depth must be at least 1"));
        }
        Ok(())
    }
}
