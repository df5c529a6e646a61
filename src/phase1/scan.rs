//! Sequential bucket scan
//!
//! Walks the sorted parent stream once, cutting it into buckets by
//! `y / BC`. A bucket is sealed (moved behind an `Arc`) as soon as the next
//! index shows up; every sealed bucket whose index directly follows the
//! previous sealed one forms a pair for the matchers. Stream positions are
//! assigned here, so they do not depend on which worker matches a pair.

use std::sync::Arc;

use crate::entry::ParentEntry;
use crate::error::{Phase1Error, Result};
use crate::matcher::Bucket;

/// Two sealed, adjacent buckets awaiting matching
#[derive(Debug)]
pub struct BucketPair<T> {
    pub left: Arc<Bucket<T>>,
    pub right: Arc<Bucket<T>>,
}

impl<T> Clone for BucketPair<T> {
    fn clone(&self) -> Self {
        Self {
            left: Arc::clone(&self.left),
            right: Arc::clone(&self.right),
        }
    }
}

/// Running state carried from one input block to the next
#[derive(Debug)]
pub struct BucketScanner<T> {
    bc: u64,
    /// Stream position of the next entry
    position: u64,
    /// Bucket still receiving entries
    current: Option<Bucket<T>>,
    /// Last sealed bucket
    previous: Option<Arc<Bucket<T>>>,
    sealed: u64,
}

impl<T: ParentEntry> BucketScanner<T> {
    pub fn new(bc: u64) -> Self {
        Self {
            bc,
            position: 0,
            current: None,
            previous: None,
            sealed: 0,
        }
    }

    /// Entries consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Buckets sealed so far
    pub fn sealed_buckets(&self) -> u64 {
        self.sealed
    }

    /// Feed one block; adjacent pairs sealed along the way go to `pairs`.
    ///
    /// Fails on the first entry whose bucket index is lower than the one
    /// being filled. Nothing after it is consumed.
    pub fn push_block(&mut self, block: &[T], pairs: &mut Vec<BucketPair<T>>) -> Result<()> {
        for entry in block {
            let index = entry.y() / self.bc;
            match self.current.as_mut() {
                Some(current) if index == current.index => {
                    current.entries.push(*entry);
                }
                Some(current) if index < current.index => {
                    return Err(Phase1Error::UnsortedInput {
                        index,
                        current: current.index,
                        position: self.position,
                    });
                }
                _ => {
                    if let Some(pair) = self.seal() {
                        pairs.push(pair);
                    }
                    let mut bucket = Bucket::new(index, self.position);
                    bucket.entries.push(*entry);
                    self.current = Some(bucket);
                }
            }
            self.position += 1;
        }
        Ok(())
    }

    /// Seal the open bucket at end of stream; returns the last adjacent
    /// pair, if any
    pub fn finish(&mut self) -> Option<BucketPair<T>> {
        self.seal()
    }

    fn seal(&mut self) -> Option<BucketPair<T>> {
        let sealed = Arc::new(self.current.take()?);
        self.sealed += 1;
        let pair = match &self.previous {
            Some(previous) if previous.index + 1 == sealed.index => Some(BucketPair {
                left: Arc::clone(previous),
                right: Arc::clone(&sealed),
            }),
            _ => None,
        };
        self.previous = Some(sealed);
        pair
    }
}
