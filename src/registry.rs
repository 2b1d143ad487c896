//! Per-call bookkeeping for the encoder.
//!
//! The [`Registry`] assigns every heap object the id it is first encoded
//! under. The [`ProcessingSet`] holds the objects whose children are being
//! walked right now. Both are keyed by handle address, live for a single
//! encode call, and are dropped with it.

use crate::object::Handle;
use rustc_hash::{FxHashMap, FxHashSet};

/// Object identity to wire id.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    ids: FxHashMap<usize, u64>,
    next: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lookup(&self, handle: &Handle) -> Option<u64> {
        self.ids.get(&handle.addr()).copied()
    }

    /// Returns the id of `handle`, assigning the next free one on first sight.
    pub(crate) fn register(&mut self, handle: &Handle) -> u64 {
        let next = &mut self.next;
        *self.ids.entry(handle.addr()).or_insert_with(|| {
            let id = *next;
            *next += 1;
            id
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Objects currently on the encoder's stack.
#[derive(Debug, Default)]
pub(crate) struct ProcessingSet(FxHashSet<usize>);

impl ProcessingSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `handle` was already being processed.
    pub(crate) fn enter(&mut self, handle: &Handle) -> bool {
        self.0.insert(handle.addr())
    }

    pub(crate) fn leave(&mut self, handle: &Handle) {
        self.0.remove(&handle.addr());
    }

    pub(crate) fn contains(&self, handle: &Handle) -> bool {
        self.0.contains(&handle.addr())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
