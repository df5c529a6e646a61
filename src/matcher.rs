//! Bucket matching
//!
//! Entries `l` and `r` of two adjacent buckets match iff, with
//! `yl = l.y`, `yr = r.y` and `parity = (yl / BC) mod 2`, for some
//! `0 <= m < 2^extra_bits`:
//!
//! ```text
//! yl / BC + 1 = yr / BC
//! (yr mod BC) / C - (yl mod BC) / C = m                     (mod B)
//! (yr mod BC) mod C - (yl mod BC) mod C = (2m + parity)^2   (mod C)
//! ```
//!
//! Rather than testing every pair, the right bucket is indexed by residue
//! and each left entry looks up its `2^extra_bits` precomputed targets.

use std::sync::Arc;

use crate::config::Phase1Config;
use crate::entry::ParentEntry;
use crate::targets::TargetTable;

/// A run of entries sharing `y / BC`, with its position in the sorted stream
#[derive(Debug, Clone)]
pub struct Bucket<T> {
    /// `y / BC` of every entry
    pub index: u64,
    /// Stream position of the first entry
    pub offset: u64,
    pub entries: Vec<T>,
}

impl<T> Bucket<T> {
    pub fn new(index: u64, offset: u64) -> Self {
        Self {
            index,
            offset,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A matched pair of parents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<T> {
    pub left: T,
    pub right: T,
    /// Stream position of `left`
    pub pos: u64,
    /// `right_index + (left_bucket_len - left_index)`
    pub off: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct RmapItem {
    pos: u32,
    count: u32,
}

/// Per-worker matcher; the residue map is reused between calls
pub struct BucketMatcher {
    targets: Arc<TargetTable>,
    rmap: Vec<RmapItem>,
    /// Residues written by the previous call
    rmap_clean: Vec<u32>,
}

impl BucketMatcher {
    pub fn new(targets: Arc<TargetTable>) -> Self {
        let rmap = vec![RmapItem::default(); targets.bc()];
        Self {
            targets,
            rmap,
            rmap_clean: Vec::new(),
        }
    }

    /// All `(left_index, right_index)` pairs satisfying the matching relation.
    ///
    /// Both slices must each hold a single bucket. Pairs come out grouped by
    /// left index, then by offset candidate.
    pub fn find_matches<T: ParentEntry>(&mut self, left: &[T], right: &[T]) -> Vec<(usize, usize)> {
        let (Some(first_left), Some(first_right)) = (left.first(), right.first()) else {
            return Vec::new();
        };
        let bc = self.targets.bc() as u64;
        let left_index = first_left.y() / bc;
        let right_index = first_right.y() / bc;
        if left_index + 1 != right_index {
            return Vec::new();
        }
        let parity = (left_index % 2) as usize;

        for &r in &self.rmap_clean {
            self.rmap[r as usize].count = 0;
        }
        self.rmap_clean.clear();

        let offset = right_index * bc;
        for (pos_r, entry) in right.iter().enumerate() {
            let r = entry.y() - offset;
            debug_assert!(r < bc, "right bucket spans more than one index");
            let item = &mut self.rmap[r as usize];
            // Equal `y`s are adjacent in a sorted bucket, so a start and a
            // count describe all of them.
            if item.count == 0 {
                item.pos = pos_r as u32;
            }
            item.count += 1;
            self.rmap_clean.push(r as u32);
        }

        let mut out = Vec::with_capacity(left.len() * 2);
        let offset_l = offset - bc;
        for (pos_l, entry) in left.iter().enumerate() {
            let r = entry.y() - offset_l;
            debug_assert!(r < bc, "left bucket spans more than one index");
            for &target in self.targets.row(parity, r as usize) {
                let item = self.rmap[target as usize];
                for j in 0..item.count {
                    out.push((pos_l, (item.pos + j) as usize));
                }
            }
        }
        out
    }

    /// Matches between two sealed buckets with their stream positions filled in
    pub fn match_buckets<T: ParentEntry>(
        &mut self,
        left: &Bucket<T>,
        right: &Bucket<T>,
    ) -> Vec<Match<T>> {
        let left_len = left.entries.len();
        self.find_matches(&left.entries, &right.entries)
            .into_iter()
            .map(|(i, j)| Match {
                left: left.entries[i],
                right: right.entries[j],
                pos: left.offset + i as u64,
                off: (j + (left_len - i)) as u32,
            })
            .collect()
    }
}

/// Direct check of the matching relation for one pair.
///
/// Used for verification and tests; the pipeline goes through
/// [`BucketMatcher`].
pub fn is_match(config: &Phase1Config, yl: u64, yr: u64) -> bool {
    let bc = u64::from(config.bc());
    if yl / bc + 1 != yr / bc {
        return false;
    }
    let (b, c) = (i128::from(config.b), i128::from(config.c));
    let parity = i128::from((yl / bc) % 2);
    let rl = i128::from(yl % bc);
    let rr = i128::from(yr % bc);
    let bucket_diff = (rr / c - rl / c).rem_euclid(b);
    let residue_diff = (rr % c - rl % c).rem_euclid(c);
    (0..i128::from(config.extra_bits_pow())).any(|m| {
        bucket_diff == m % b && residue_diff == ((2 * m + parity) * (2 * m + parity)) % c
    })
}
