//! Bookkeeping/checkpoint layer. Three insertion-ordered maps keyed by
//! `(K_a, K_b)` -- DL, `e_{rs}`, and tagged partition -- plus a trace
//! of transitions.

use bisbm_types::{EdgeBlockMatrix, Partition};
use rustc_hash::FxHashMap;

use crate::entropy::DescriptionLength;

/// Where a recorded partition at some `(K_a, K_b)` came from:
/// `MB[(K_a,K_b)] -> (origin, partition)` with
/// `origin in {engine, merge, natural}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Engine,
    Merge,
    Natural,
}

/// A transition kind recorded in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Mcmc,
    Merge,
    Rollback,
    Escape,
    Mdl,
}

#[derive(Debug, Clone, Copy)]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub k_a: u32,
    pub k_b: u32,
}

struct Entry {
    dl: DescriptionLength,
    e_rs: EdgeBlockMatrix,
    origin: Origin,
    partition: Partition,
}

/// Insertion-ordered bookkeeping store. A plain `Vec` plus an index
/// map rather than a third-party ordered-map crate (see
/// `EdgeBlockMatrix`'s flattened `Vec` instead of `Vec<Vec<_>>`).
#[derive(Default)]
pub struct Bookkeeping {
    order: Vec<(u32, u32)>,
    index: FxHashMap<(u32, u32), usize>,
    entries: Vec<Entry>,
    trace: Vec<TraceEntry>,
}

impl Bookkeeping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the record at `(k_a, k_b)`. Overwriting
    /// an existing key keeps its original insertion position, so
    /// tie-breaking by first-seen order is unaffected by
    /// recomputation.
    pub fn record(
        &mut self,
        k_a: u32,
        k_b: u32,
        dl: DescriptionLength,
        e_rs: EdgeBlockMatrix,
        origin: Origin,
        partition: Partition,
    ) {
        let entry = Entry {
            dl,
            e_rs,
            origin,
            partition,
        };
        if let Some(&i) = self.index.get(&(k_a, k_b)) {
            self.entries[i] = entry;
        } else {
            self.index.insert((k_a, k_b), self.entries.len());
            self.order.push((k_a, k_b));
            self.entries.push(entry);
        }
    }

    pub fn contains(&self, k_a: u32, k_b: u32) -> bool {
        self.index.contains_key(&(k_a, k_b))
    }

    pub fn dl(&self, k_a: u32, k_b: u32) -> Option<&DescriptionLength> {
        self.index.get(&(k_a, k_b)).map(|&i| &self.entries[i].dl)
    }

    pub fn e_rs(&self, k_a: u32, k_b: u32) -> Option<&EdgeBlockMatrix> {
        self.index.get(&(k_a, k_b)).map(|&i| &self.entries[i].e_rs)
    }

    pub fn partition(&self, k_a: u32, k_b: u32) -> Option<&Partition> {
        self.index
            .get(&(k_a, k_b))
            .map(|&i| &self.entries[i].partition)
    }

    pub fn origin(&self, k_a: u32, k_b: u32) -> Option<Origin> {
        self.index.get(&(k_a, k_b)).map(|&i| self.entries[i].origin)
    }

    /// `argmin_{(K_a,K_b)} DL` over everything recorded so far.
    /// Ties broken by first-seen (insertion) order.
    pub fn argmin(&self) -> Option<(u32, u32)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &key) in self.order.iter().enumerate() {
            let dl = self.entries[self.index[&key]].dl.total();
            match best {
                Some((_, best_dl)) if dl >= best_dl => {}
                _ => best = Some((i, dl)),
            }
        }
        best.map(|(i, _)| self.order[i])
    }

    pub fn push_trace(&mut self, kind: TraceKind, k_a: u32, k_b: u32) {
        self.trace.push(TraceEntry { kind, k_a, k_b });
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Insertion-ordered iteration over `(K_a, K_b) -> DL`, per spec
    /// §3's "Insertion-ordered iteration (for tracing)".
    pub fn iter_dl(&self) -> impl Iterator<Item = ((u32, u32), f64)> + '_ {
        self.order
            .iter()
            .map(move |&key| (key, self.entries[self.index[&key]].dl.total()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
