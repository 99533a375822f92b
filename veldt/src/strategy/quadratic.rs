//! Guttman's quadratic-cost split strategy.

use serde::{Deserialize, Serialize};

use super::{
    choose_least_enlargement, validate_capacity, Bounded, SplitGroup, Strategy,
    DEFAULT_MAX_ELEMENTS, DEFAULT_MIN_ELEMENTS,
};
use crate::bounding_box::BoundingBox;
use crate::error::SpatialResult;
use crate::node::ChildRef;

/// The quadratic split strategy.
///
/// Subtree choice minimizes area enlargement; splits seed the groups with
/// the pair of entries that would waste the most area if kept together, then
/// repeatedly assign the entry with the strongest preference for either
/// group. More split work than [`Linear`](super::Linear), tighter groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quadratic {
    max_elements: usize,
    min_elements: usize,
}

impl Quadratic {
    /// Creates a quadratic strategy, validating `max_elements >= 2` and
    /// `1 <= min_elements <= max_elements / 2`.
    pub fn new(max_elements: usize, min_elements: usize) -> SpatialResult<Quadratic> {
        validate_capacity(max_elements, min_elements)?;
        Ok(Quadratic {
            max_elements,
            min_elements,
        })
    }
}

impl Default for Quadratic {
    fn default() -> Quadratic {
        Quadratic {
            max_elements: DEFAULT_MAX_ELEMENTS,
            min_elements: DEFAULT_MIN_ELEMENTS,
        }
    }
}

impl Strategy for Quadratic {
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

        let mut bbox1 = group1[0].mbr();
        let mut bbox2 = group2[0].mbr();

        while !rest.is_empty() {
            // Once a group must take everything left to reach the minimum,
            // stop weighing preferences.
            if group1.len() + rest.len() <= self.min_elements {
                for entry in rest.drain(..) {
                    bbox1.expand(&entry.mbr());
                    group1.push(entry);
                }
                break;
            }
            if group2.len() + rest.len() <= self.min_elements {
                for entry in rest.drain(..) {
                    bbox2.expand(&entry.mbr());
                    group2.push(entry);
                }
                break;
            }

            let next = pick_next(&rest, &bbox1, &bbox2);
            let entry = rest.swap_remove(next);
            let key = entry.mbr();

            let cost1 = (bbox1.enlargement(&key), bbox1.area(), group1.len());
            let cost2 = (bbox2.enlargement(&key), bbox2.area(), group2.len());
            if cost1 <= cost2 {
                bbox1.expand(&key);
                group1.push(entry);
            } else {
                bbox2.expand(&key);
                group2.push(entry);
            }
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
}

/// Finds the pair of entries that would waste the most area if combined:
/// `area(union) - area(a) - area(b)` maximized over all pairs.
fn pick_seeds<E: Bounded<D>, const D: usize>(entries: &[E]) -> (usize, usize) {
    debug_assert!(entries.len() >= 2);

    let mut worst = f64::NEG_INFINITY;
    let mut seeds = (0, 1);
    for i in 0..entries.len() {
        let a = entries[i].mbr();
        for j in (i + 1)..entries.len() {
            let b = entries[j].mbr();
            let dead = a.union(&b).area() - a.area() - b.area();
            if dead > worst {
                worst = dead;
                seeds = (i, j);
            }
        }
    }
    seeds
}

/// Finds the unassigned entry with the strongest preference for either
/// group, measured as the difference between its two enlargement costs.
fn pick_next<E: Bounded<D>, const D: usize>(
    rest: &[E],
    bbox1: &BoundingBox<D>,
    bbox2: &BoundingBox<D>,
) -> usize {
    let mut best = 0;
    let mut best_preference = f64::NEG_INFINITY;
    for (i, entry) in rest.iter().enumerate() {
        let key = entry.mbr();
        let preference = (bbox1.enlargement(&key) - bbox2.enlargement(&key)).abs();
        if preference > best_preference {
            best_preference = preference;
            best = i;
        }
    }
    best
}
