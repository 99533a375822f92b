//! Guttman's linear-cost split strategy.

use serde::{Deserialize, Serialize};

use super::{
    choose_least_enlargement, validate_capacity, Bounded, SplitGroup, Strategy,
    DEFAULT_MAX_ELEMENTS, DEFAULT_MIN_ELEMENTS,
};
use crate::bounding_box::BoundingBox;
use crate::error::SpatialResult;
use crate::node::ChildRef;

/// The linear split strategy.
///
/// Subtree choice minimizes area enlargement; splits seed the two groups
/// with the pair of entries showing the greatest normalized separation along
/// any single axis and distribute the rest greedily. Cheapest inserts of the
/// three strategies, loosest groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Linear {
    max_elements: usize,
    min_elements: usize,
}

impl Linear {
    /// Creates a linear strategy, validating `max_elements >= 2` and
    /// `1 <= min_elements <= max_elements / 2`.
    pub fn new(max_elements: usize, min_elements: usize) -> SpatialResult<Linear> {
        validate_capacity(max_elements, min_elements)?;
        Ok(Linear {
            max_elements,
            min_elements,
        })
    }
}

impl Default for Linear {
    fn default() -> Linear {
        Linear {
            max_elements: DEFAULT_MAX_ELEMENTS,
            min_elements: DEFAULT_MIN_ELEMENTS,
        }
    }
}

impl Strategy for Linear {
    fn max_elements(&self) -> usize {
        self.max_elements
    }

    fn min_elements(&self) -> usize {
        self.min_elements
    }

    fn choose_subtree<V, const D: usize>(
        &self,
        children: &[ChildRef<V, D>],
        key: &BoundingBox<D>,
    ) -> usize {
        choose_least_enlargement(children, key)
    }

    fn split<E: Bounded<D>, const D: usize>(
        &self,
        entries: Vec<E>,
    ) -> (SplitGroup<E, D>, SplitGroup<E, D>) {
        debug_assert_eq!(entries.len(), self.max_elements + 1);

        let (seed1, seed2) = pick_seeds(&entries);
        distribute(entries, seed1, seed2, self.min_elements)
    }
}

/// Finds the seed pair with the greatest normalized separation over all
/// axes: the entry with the highest minimum edge versus the entry with the
/// lowest maximum edge, scaled by the total extent of that axis.
fn pick_seeds<E: Bounded<D>, const D: usize>(entries: &[E]) -> (usize, usize) {
    let mut best_separation = f64::NEG_INFINITY;
    let mut seeds = (0, 1);
    for dim in 0..D {
        let (separation, seed1, seed2) = greatest_normalized_separation(entries, dim);
        if separation > best_separation {
            best_separation = separation;
            seeds = (seed1, seed2);
        }
    }
    seeds
}

fn greatest_normalized_separation<E: Bounded<D>, const D: usize>(
    entries: &[E],
    dim: usize,
) -> (f64, usize, usize) {
    debug_assert!(entries.len() >= 2);

    let first = entries[0].mbr();
    let mut lowest_low = first.min[dim];
    let mut highest_high = first.max[dim];
    let mut lowest_high = first.max[dim];
    let mut lowest_high_index = 0;

    for (i, entry) in entries.iter().enumerate().skip(1) {
        let mbr = entry.mbr();
        if mbr.max[dim] < lowest_high {
            lowest_high = mbr.max[dim];
            lowest_high_index = i;
        }
        lowest_low = lowest_low.min(mbr.min[dim]);
        highest_high = highest_high.max(mbr.max[dim]);
    }

    // The other seed must be a different entry, even when degenerate.
    let mut highest_low_index = if lowest_high_index == 0 { 1 } else { 0 };
    let mut highest_low = entries[highest_low_index].mbr().min[dim];
    for (i, entry) in entries.iter().enumerate().skip(highest_low_index) {
        if i == lowest_high_index {
            continue;
        }
        let min_coord = entry.mbr().min[dim];
        if highest_low < min_coord {
            highest_low = min_coord;
            highest_low_index = i;
        }
    }

    let width = highest_high - lowest_low;
    let separation = if width == 0.0 {
        0.0
    } else {
        (highest_low - lowest_high) / width
    };
    (separation, highest_low_index, lowest_high_index)
}

/// Distributes entries around two seeds: each goes to the group whose box
/// grows least (ties broken by smaller area, then fewer entries), except
/// when one group must absorb everything left to reach `min_elements`.
fn distribute<E: Bounded<D>, const D: usize>(
    entries: Vec<E>,
    seed1: usize,
    seed2: usize,
    min_elements: usize,
) -> (SplitGroup<E, D>, SplitGroup<E, D>) {
    debug_assert_ne!(seed1, seed2);

    let capacity = entries.len();
    let mut group1: Vec<E> = Vec::with_capacity(capacity);
    let mut group2: Vec<E> = Vec::with_capacity(capacity);
    let mut rest: Vec<E> = Vec::with_capacity(capacity);
    for (i, entry) in entries.into_iter().enumerate() {
        if i == seed1 {
            group1.push(entry);
        } else if i == seed2 {
            group2.push(entry);
        } else {
            rest.push(entry);
        }
    }

    let mut bbox1: BoundingBox<D> = group1[0].mbr();
    let mut bbox2: BoundingBox<D> = group2[0].mbr();

    let mut remaining = rest.len();
    for entry in rest {
        let key = entry.mbr();
        let to_first = if group1.len() + remaining <= min_elements {
            true
        } else if group2.len() + remaining <= min_elements {
            false
        } else {
            let cost1 = (bbox1.enlargement(&key), bbox1.area(), group1.len());
            let cost2 = (bbox2.enlargement(&key), bbox2.area(), group2.len());
            cost1 <= cost2
        };

        if to_first {
            bbox1.expand(&key);
            group1.push(entry);
        } else {
            bbox2.expand(&key);
            group2.push(entry);
        }
        remaining -= 1;
    }

    (
        SplitGroup {
            bbox: bbox1,
            entries: group1,
        },
        SplitGroup {
            bbox: bbox2,
            entries: group2,
        },
    )
}
