//! Tables 2 to 7: the mixing function
//!
//! The hash input is the left `y` followed by both parents' metadata. For
//! tables 2 and 3 the child metadata is the plain concatenation of the
//! parents' metadata; for tables 4 to 6 it is cut out of the digest right
//! after the bits used for `y`. Table 7 carries no metadata.

use crate::bits::Bits;
use crate::config::Phase1Config;
use crate::entry::{ParentEntry, TableEntry};
use crate::error::{Phase1Error, Result};
use crate::matcher::Match;

/// How a table derives the metadata it hands to the next table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataMode {
    /// Child metadata is `left.meta ++ right.meta`
    Concat,
    /// Child metadata is sliced out of the digest
    FromHash,
    /// Last table, nothing to carry
    None,
}

impl MetadataMode {
    pub fn for_table(table_index: u8) -> Self {
        match table_index {
            2 | 3 => MetadataMode::Concat,
            4..=6 => MetadataMode::FromHash,
            _ => MetadataMode::None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FxCalculator {
    table_index: u8,
    mode: MetadataMode,
    y_bits: usize,
    /// Width of each parent's metadata
    parent_meta_bits: usize,
    /// Width of the metadata produced here
    meta_bits: usize,
}

impl FxCalculator {
    pub fn new(config: &Phase1Config, table_index: u8) -> Result<Self> {
        if !(2..=7).contains(&table_index) {
            return Err(Phase1Error::InvalidTable(table_index));
        }
        Ok(Self {
            table_index,
            mode: MetadataMode::for_table(table_index),
            y_bits: config.y_bits(),
            parent_meta_bits: config.metadata_bits(table_index - 1),
            meta_bits: config.metadata_bits(table_index),
        })
    }

    pub fn table_index(&self) -> u8 {
        self.table_index
    }

    pub fn mode(&self) -> MetadataMode {
        self.mode
    }

    pub(crate) fn hash_input(&self, left_y: u64, left_meta: u128, right_meta: u128) -> Bits {
        let mut input = Bits::from_value(u128::from(left_y), self.y_bits);
        input.append(left_meta, self.parent_meta_bits);
        input.append(right_meta, self.parent_meta_bits);
        input
    }

    /// Child `(y, metadata)` for a matched pair
    pub fn evaluate(&self, left_y: u64, left_meta: u128, right_meta: u128) -> (u64, u128) {
        let input = self.hash_input(left_y, left_meta, right_meta);
        let hash = blake3::hash(input.as_bytes());
        let hash = hash.as_bytes();

        let head = u64::from_be_bytes([
            hash[0], hash[1], hash[2], hash[3], hash[4], hash[5], hash[6], hash[7],
        ]);
        let y = head >> (64 - self.y_bits);

        let meta = match self.mode {
            MetadataMode::Concat => input.slice(self.y_bits, input.len()).to_u128(),
            MetadataMode::FromHash => {
                // Whole bytes around the window first, then drop the partial
                // bits at either end.
                let start_byte = self.y_bits / 8;
                let end_bit = self.y_bits + self.meta_bits;
                let end_byte = end_bit.div_ceil(8);
                let window = Bits::from_bytes(&hash[start_byte..end_byte]);
                window
                    .slice(self.y_bits % 8, end_bit - start_byte * 8)
                    .to_u128()
            }
            MetadataMode::None => 0,
        };

        (y, meta)
    }

    /// Child entry for a match, positions taken from the match
    pub fn evaluate_match<T: ParentEntry>(&self, m: &Match<T>) -> TableEntry {
        let (y, meta) = self.evaluate(m.left.y(), m.left.metadata(), m.right.metadata());
        TableEntry {
            y,
            pos: m.pos,
            off: m.off,
            meta,
        }
    }
}
