//! Table entry records
//!
//! Table 1 holds `(x, y)` pairs straight out of the keystream. Tables 2 to 7
//! hold the mixed `y`, the back-reference to both parents and the metadata
//! the next table needs.

use std::fmt;
use std::str::FromStr;

/// 32-byte identifier seeding every derivation of one plot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlotId(pub [u8; 32]);

impl PlotId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for PlotId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for PlotId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| anyhow::anyhow!("plot id must be 32 bytes, got {}", v.len()))?;
        Ok(Self(bytes))
    }
}

/// Table 1 entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Table1Entry {
    pub x: u32,
    pub y: u64,
}

/// Entry of tables 2 to 7
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TableEntry {
    pub y: u64,
    /// Position of the left parent in the sorted parent table
    pub pos: u64,
    /// Right parent offset: `right_index + (left_bucket_len - left_index)`
    pub off: u32,
    /// Metadata, right-aligned; width given by `Phase1Config::metadata_bits`
    pub meta: u128,
}

/// What the side output keeps of a table 2..7 entry once it has been matched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PositionEntry {
    pub y: u64,
    pub pos: u64,
    pub off: u32,
}

/// Anything that can sit on the left or right of a match
pub trait ParentEntry: Copy + Send + Sync {
    /// Form forwarded to the side output
    type Carry: Send;

    fn y(&self) -> u64;

    /// Full metadata, right-aligned
    fn metadata(&self) -> u128;

    fn carry(&self) -> Self::Carry;
}

impl ParentEntry for Table1Entry {
    type Carry = Table1Entry;

    fn y(&self) -> u64 {
        self.y
    }

    fn metadata(&self) -> u128 {
        u128::from(self.x)
    }

    fn carry(&self) -> Table1Entry {
        *self
    }
}

impl ParentEntry for TableEntry {
    type Carry = PositionEntry;

    fn y(&self) -> u64 {
        self.y
    }

    fn metadata(&self) -> u128 {
        self.meta
    }

    fn carry(&self) -> PositionEntry {
        PositionEntry {
            y: self.y,
            pos: self.pos,
            off: self.off,
        }
    }
}
