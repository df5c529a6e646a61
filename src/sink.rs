//! Output boundary
//!
//! Sinks belong to the sort engine: they accept entries in any order and own
//! their sort/flush lifecycle. `finish` is called exactly once, after the
//! last `add`, and only when the pass succeeded.

use anyhow::Result;

pub trait EntrySink<T>: Send {
    fn add(&mut self, entry: T);

    fn add_block(&mut self, block: Vec<T>) {
        for entry in block {
            self.add(entry);
        }
    }

    /// No more entries will arrive
    fn finish(&mut self) -> Result<()>;
}

impl<T, S: EntrySink<T> + ?Sized> EntrySink<T> for &mut S {
    fn add(&mut self, entry: T) {
        (**self).add(entry)
    }

    fn add_block(&mut self, block: Vec<T>) {
        (**self).add_block(block)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Collects everything in memory
#[derive(Debug)]
pub struct VecSink<T> {
    entries: Vec<T>,
    finished: bool,
}

impl<T> Default for VecSink<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            finished: false,
        }
    }
}

impl<T> VecSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            finished: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn into_inner(self) -> Vec<T> {
        self.entries
    }

    /// Entries sorted by `key`; stands in for a sort engine on small tables
    pub fn into_sorted_by_key<K: Ord>(self, key: impl FnMut(&T) -> K) -> Vec<T> {
        let mut entries = self.entries;
        entries.sort_unstable_by_key(key);
        entries
    }
}

impl<T: Send> EntrySink<T> for VecSink<T> {
    fn add(&mut self, entry: T) {
        self.entries.push(entry);
    }

    fn add_block(&mut self, mut block: Vec<T>) {
        self.entries.append(&mut block);
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            anyhow::bail!("sink finished twice");
        }
        self.finished = true;
        Ok(())
    }
}

/// Counts and drops entries
#[derive(Debug, Default)]
pub struct NullSink {
    pub count: u64,
    pub finished: bool,
}

impl<T> EntrySink<T> for NullSink {
    fn add(&mut self, _entry: T) {
        self.count += 1;
    }

    fn add_block(&mut self, block: Vec<T>) {
        self.count += block.len() as u64;
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
