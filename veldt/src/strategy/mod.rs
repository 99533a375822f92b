//! Insertion and redistribution strategies.
//!
//! A [`Strategy`] bundles the capacity parameters of a tree with its two
//! structural decisions: which subtree receives a new entry
//! ([`Strategy::choose_subtree`]) and how an overflowing node is partitioned
//! ([`Strategy::split`]). The strategy is a type parameter of the tree, so
//! the choice is made once at construction time and dispatched statically.
//!
//! Three strategies are provided:
//!
//! - [`Linear`]: Guttman's linear-cost seeds, cheapest inserts.
//! - [`Quadratic`]: Guttman's quadratic-cost seeds, better grouping.
//! - [`RStar`]: margin/overlap-driven splits with forced reinsertion,
//!   best query performance, the default.

mod linear;
mod quadratic;
mod rstar;

pub use linear::Linear;
pub use quadratic::Quadratic;
pub use rstar::RStar;

use crate::bounding_box::BoundingBox;
use crate::error::{SpatialError, SpatialResult};
use crate::node::ChildRef;

/// Entries a splitter can partition: anything with a bounding box.
pub trait Bounded<const D: usize> {
    /// The bounding box of this entry.
    fn mbr(&self) -> BoundingBox<D>;
}

impl<V, const D: usize> Bounded<D> for ChildRef<V, D> {
    fn mbr(&self) -> BoundingBox<D> {
        self.bbox
    }
}

/// Leaf entries are split as `(key, value)` pairs so each key is computed
/// once per split.
impl<V, const D: usize> Bounded<D> for (BoundingBox<D>, V) {
    fn mbr(&self) -> BoundingBox<D> {
        self.0
    }
}

/// One side of a node split: the entries and their exact bounding box.
#[derive(Debug)]
pub struct SplitGroup<E, const D: usize> {
    /// Minimum bounding box of `entries`.
    pub bbox: BoundingBox<D>,
    /// The entries assigned to this side.
    pub entries: Vec<E>,
}

impl<E: Bounded<D>, const D: usize> SplitGroup<E, D> {
    /// Builds a group from its entries, computing their exact bounding box.
    pub fn new(entries: Vec<E>) -> SplitGroup<E, D> {
        let mut bbox = BoundingBox::empty();
        for entry in &entries {
            bbox.expand(&entry.mbr());
        }
        SplitGroup { bbox, entries }
    }
}

/// An insertion/redistribution strategy together with its capacity
/// parameters.
pub trait Strategy: Clone {
    /// Maximum number of entries a node may hold.
    fn max_elements(&self) -> usize;

    /// Minimum number of entries a non-root node must hold.
    fn min_elements(&self) -> usize;

    /// Number of entries evicted by forced reinsertion when a node
    /// overflows; 0 disables forced reinsertion.
    fn reinsert_count(&self) -> usize {
        0
    }

    /// Picks the child of an internal node to descend into when inserting
    /// an entry with bounding box `key`. `children` is never empty.
    fn choose_subtree<V, const D: usize>(
        &self,
        children: &[ChildRef<V, D>],
        key: &BoundingBox<D>,
    ) -> usize;

    /// Partitions `max_elements + 1` entries into two groups, each holding
    /// between `min_elements` and `max_elements` entries.
    fn split<E: Bounded<D>, const D: usize>(
        &self,
        entries: Vec<E>,
    ) -> (SplitGroup<E, D>, SplitGroup<E, D>);
}

/// Validates the shared capacity constraints.
pub(crate) fn validate_capacity(max_elements: usize, min_elements: usize) -> SpatialResult<()> {
    if max_elements < 2 {
        return Err(SpatialError::InvalidParameters(format!(
            "max_elements must be at least 2, got {}",
            max_elements
        )));
    }
    if min_elements == 0 {
        return Err(SpatialError::InvalidParameters(
            "min_elements must be at least 1".into(),
        ));
    }
    if min_elements > max_elements / 2 {
        return Err(SpatialError::InvalidParameters(format!(
            "min_elements ({}) must not exceed max_elements / 2 ({})",
            min_elements,
            max_elements / 2
        )));
    }
    Ok(())
}

/// Default capacity used by the `Default` impls of all three strategies.
pub(crate) const DEFAULT_MAX_ELEMENTS: usize = 16;
pub(crate) const DEFAULT_MIN_ELEMENTS: usize = 6;

/// Classic subtree choice: least area enlargement, ties broken by smaller
/// area, then by fewer entries in the child.
pub(crate) fn choose_least_enlargement<V, const D: usize>(
    children: &[ChildRef<V, D>],
    key: &BoundingBox<D>,
) -> usize {
    debug_assert!(!children.is_empty());

    let mut best = 0;
    let mut best_cost = (f64::INFINITY, f64::INFINITY, usize::MAX);
    for (i, child) in children.iter().enumerate() {
        let cost = (
            child.bbox.enlargement(key),
            child.bbox.area(),
            child.node.len(),
        );
        if cost < best_cost {
            best_cost = cost;
            best = i;
        }
    }
    best
}
