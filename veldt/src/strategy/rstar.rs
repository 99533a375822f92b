//! The R*-style split strategy.

use serde::{Deserialize, Serialize};

use super::{
    choose_least_enlargement, validate_capacity, Bounded, SplitGroup, Strategy,
    DEFAULT_MAX_ELEMENTS, DEFAULT_MIN_ELEMENTS,
};
use crate::bounding_box::BoundingBox;
use crate::error::SpatialResult;
use crate::node::ChildRef;

/// Default number of least-enlargement candidates examined by the overlap
/// cost computation when an internal node fans out wider than this.
const DEFAULT_OVERLAP_COST_THRESHOLD: usize = 32;

/// The R* strategy: cost-based subtree choice, margin-driven split axis
/// selection and forced reinsertion on overflow.
///
/// Above leaf level, subtree choice minimizes area enlargement. Directly
/// over leaves it minimizes the overlap-enlargement cost against the
/// sibling entries, which is what makes R* trees read-optimized. Splits
/// pick the axis with the least total margin over all valid distributions,
/// then the distribution with the least overlap. The first time a level
/// overflows during an insert, the entries farthest from the node's center
/// are reinserted instead of splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RStar {
    max_elements: usize,
    min_elements: usize,
    reinsert_count: usize,
    overlap_cost_threshold: usize,
}

impl RStar {
    /// Creates an R* strategy, validating `max_elements >= 2` and
    /// `1 <= min_elements <= max_elements / 2`.
    ///
    /// `reinsert_count` defaults to `3 * max_elements / 10` and
    /// `overlap_cost_threshold` to 32; both can be adjusted with the
    /// builder-style setters.
    pub fn new(max_elements: usize, min_elements: usize) -> SpatialResult<RStar> {
        validate_capacity(max_elements, min_elements)?;
        Ok(RStar {
            max_elements,
            min_elements,
            reinsert_count: default_reinsert_count(max_elements, min_elements),
            overlap_cost_threshold: DEFAULT_OVERLAP_COST_THRESHOLD,
        })
    }

    /// Sets the number of entries evicted by forced reinsertion; 0 disables
    /// it. Values that would leave a node under `min_elements` are clamped.
    pub fn with_reinsert_count(mut self, count: usize) -> RStar {
        self.reinsert_count = count.min(self.max_elements + 1 - self.min_elements);
        self
    }

    /// Sets how many least-enlargement candidates the overlap cost
    /// computation examines on wide nodes; 0 means always examine all.
    pub fn with_overlap_cost_threshold(mut self, threshold: usize) -> RStar {
        self.overlap_cost_threshold = threshold;
        self
    }

    /// The configured overlap cost threshold.
    pub fn overlap_cost_threshold(&self) -> usize {
        self.overlap_cost_threshold
    }
}

fn default_reinsert_count(max_elements: usize, min_elements: usize) -> usize {
    (3 * max_elements / 10).min(max_elements + 1 - min_elements)
}

impl Default for RStar {
    fn default() -> RStar {
        RStar {
            max_elements: DEFAULT_MAX_ELEMENTS,
            min_elements: DEFAULT_MIN_ELEMENTS,
            reinsert_count: default_reinsert_count(DEFAULT_MAX_ELEMENTS, DEFAULT_MIN_ELEMENTS),
            overlap_cost_threshold: DEFAULT_OVERLAP_COST_THRESHOLD,
        }
    }
}

impl Strategy for RStar {
    fn max_elements(&self) -> usize {
        self.max_elements
    }

    fn min_elements(&self) -> usize {
        self.min_elements
    }

    fn reinsert_count(&self) -> usize {
        self.reinsert_count
    }

    fn choose_subtree<V, const D: usize>(
        &self,
        children: &[ChildRef<V, D>],
        key: &BoundingBox<D>,
    ) -> usize {
        debug_assert!(!children.is_empty());

        // Overlap cost only pays off directly above the leaves.
        if !children[0].node.is_leaf() {
            return choose_least_enlargement(children, key);
        }

        let mut candidates: Vec<usize> = (0..children.len()).collect();
        if self.overlap_cost_threshold > 0 && children.len() > self.overlap_cost_threshold {
            candidates.sort_by(|&a, &b| {
                let ea = children[a].bbox.enlargement(key);
                let eb = children[b].bbox.enlargement(key);
                ea.partial_cmp(&eb).unwrap_or(std::cmp::Ordering::Equal)
            });
            candidates.truncate(self.overlap_cost_threshold);
        }

        let mut best = candidates[0];
        let mut best_cost = (f64::INFINITY, f64::INFINITY, f64::INFINITY);
        for &i in &candidates {
            let bbox = &children[i].bbox;
            let expanded = bbox.union(key);

            let mut overlap_increase = 0.0;
            for (j, sibling) in children.iter().enumerate() {
                if j == i {
                    continue;
                }
                overlap_increase += expanded.intersection_area(&sibling.bbox)
                    - bbox.intersection_area(&sibling.bbox);
            }

            let cost = (
                overlap_increase,
                expanded.area() - bbox.area(),
                expanded.area(),
            );
            if cost < best_cost {
                best_cost = cost;
                best = i;
            }
        }
        best
    }

    fn split<E: Bounded<D>, const D: usize>(
        &self,
        mut entries: Vec<E>,
    ) -> (SplitGroup<E, D>, SplitGroup<E, D>) {
        debug_assert_eq!(entries.len(), self.max_elements + 1);

        let count = entries.len();
        let min = self.min_elements;

        // Pick the split axis and edge ordering whose distributions have the
        // least total margin.
        let mut best_margin = f64::INFINITY;
        let mut best_axis = 0;
        let mut best_upper = false;
        for axis in 0..D {
            for upper in [false, true] {
                sort_by_edge(&mut entries, axis, upper);
                let (prefix, suffix) = box_scans(&entries);

                let mut margin_sum = 0.0;
                for k in min..=(count - min) {
                    margin_sum += prefix[k - 1].margin() + suffix[k].margin();
                }
                if margin_sum < best_margin {
                    best_margin = margin_sum;
                    best_axis = axis;
                    best_upper = upper;
                }
            }
        }

        // On the chosen axis, pick the distribution with the least overlap
        // between the groups, ties broken by least total area.
        sort_by_edge(&mut entries, best_axis, best_upper);
        let (prefix, suffix) = box_scans(&entries);

        let mut best_k = min;
        let mut best_cost = (f64::INFINITY, f64::INFINITY);
        for k in min..=(count - min) {
            let first = &prefix[k - 1];
            let second = &suffix[k];
            let cost = (
                first.intersection_area(second),
                first.area() + second.area(),
            );
            if cost < best_cost {
                best_cost = cost;
                best_k = k;
            }
        }

        let bbox1 = prefix[best_k - 1];
        let bbox2 = suffix[best_k];
        let second = entries.split_off(best_k);
        (
            SplitGroup {
                bbox: bbox1,
                entries,
            },
            SplitGroup {
                bbox: bbox2,
                entries: second,
            },
        )
    }
}

fn sort_by_edge<E: Bounded<D>, const D: usize>(entries: &mut [E], axis: usize, upper: bool) {
    entries.sort_by(|a, b| {
        let (ka, kb) = if upper {
            (a.mbr().max[axis], b.mbr().max[axis])
        } else {
            (a.mbr().min[axis], b.mbr().min[axis])
        };
        ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Running unions over the sorted entries: `prefix[i]` bounds
/// `entries[..=i]`, `suffix[i]` bounds `entries[i..]`.
fn box_scans<E: Bounded<D>, const D: usize>(
    entries: &[E],
) -> (Vec<BoundingBox<D>>, Vec<BoundingBox<D>>) {
    let count = entries.len();

    let mut prefix = Vec::with_capacity(count);
    let mut running = BoundingBox::empty();
    for entry in entries {
        running.expand(&entry.mbr());
        prefix.push(running);
    }

    let mut suffix = vec![BoundingBox::empty(); count];
    let mut running = BoundingBox::empty();
    for i in (0..count).rev() {
        running.expand(&entries[i].mbr());
        suffix[i] = running;
    }

    (prefix, suffix)
}
