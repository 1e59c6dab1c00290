use crate::region::{FreeRegion, Interval};
use std::collections::VecDeque;

/// First-fit list of reusable ranges inside one virtual area.
///
/// Nodes are searched front to back; freed ranges are pushed at the front.
/// Adjacent nodes are never merged.
///
/// # Invariants
/// - No node is empty.
/// - Nodes of one list are pairwise disjoint (maintained by the callers).
#[derive(Clone, Debug, Default)]
pub struct FreeList {
    nodes: VecDeque<FreeRegion>,
}

impl FreeList {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: VecDeque::new(),
        }
    }

    /// Make `range` available for reuse. Empty ranges are dropped.
    pub fn push_front(&mut self, range: Interval) {
        if !range.is_empty() {
            self.nodes.push_front(FreeRegion::new(range));
        }
    }

    /// Carve `size` bytes off the first node large enough to hold them.
    ///
    /// An exactly fitting node is unlinked; a larger one keeps its tail.
    pub fn take_first_fit(&mut self, size: u32) -> Option<Interval> {
        let index = self
            .nodes
            .iter()
            .position(|node| node.range().len() >= size)?;
        let range = self.nodes[index].range();
        let taken = Interval::with_len(range.start(), size)?;
        if taken.end() == range.end() {
            self.nodes.remove(index);
        } else {
            self.nodes[index] = FreeRegion::new(Interval::new(taken.end(), range.end()));
        }
        Some(taken)
    }

    /// Whether any node shares a byte with `range`.
    #[must_use]
    pub fn overlaps(&self, range: Interval) -> bool {
        self.nodes.iter().any(|node| node.range().overlaps(range))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FreeRegion> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
