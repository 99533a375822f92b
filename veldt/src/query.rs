//! The query engine: pruned range queries and best-first nearest-neighbor
//! search.
//!
//! Both query forms are lazy iterators borrowing the tree. A range query
//! walks the tree with an explicit frame stack and descends only into
//! subtrees whose bounding box passes the predicate; the nearest-neighbor
//! search drives a min-priority queue keyed by the lower-bound distance of
//! each pending node or value, which yields values in non-decreasing true
//! distance without ever expanding a branch that cannot improve on the
//! results found so far.

use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use crate::bounding_box::BoundingBox;
use crate::node::{ChildRef, Node};
use crate::translator::Translator;

/// A spatial filter driving a range query.
///
/// `accept_bounds` decides whether a subtree may contain matches and must
/// only over-approximate `accept_value`: whenever some key inside `bounds`
/// would be accepted, `accept_bounds` must return `true` for `bounds`.
pub trait SpatialPredicate<const D: usize> {
    /// Checks whether a subtree covered by `bounds` may contain matches.
    fn accept_bounds(&self, bounds: &BoundingBox<D>) -> bool;

    /// Checks whether a value with key `key` matches.
    fn accept_value(&self, key: &BoundingBox<D>) -> bool;
}

/// Matches values whose key intersects the query box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersects<const D: usize>(pub BoundingBox<D>);

impl<const D: usize> SpatialPredicate<D> for Intersects<D> {
    fn accept_bounds(&self, bounds: &BoundingBox<D>) -> bool {
        bounds.intersects(&self.0)
    }

    fn accept_value(&self, key: &BoundingBox<D>) -> bool {
        key.intersects(&self.0)
    }
}

/// Matches values whose key lies entirely inside the query box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoveredBy<const D: usize>(pub BoundingBox<D>);

impl<const D: usize> SpatialPredicate<D> for CoveredBy<D> {
    fn accept_bounds(&self, bounds: &BoundingBox<D>) -> bool {
        // A covered value can sit in a subtree that only partially
        // intersects the query box.
        bounds.intersects(&self.0)
    }

    fn accept_value(&self, key: &BoundingBox<D>) -> bool {
        self.0.contains(key)
    }
}

/// Matches every value; backs whole-tree iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Everything;

impl<const D: usize> SpatialPredicate<D> for Everything {
    fn accept_bounds(&self, _bounds: &BoundingBox<D>) -> bool {
        true
    }

    fn accept_value(&self, _key: &BoundingBox<D>) -> bool {
        true
    }
}

enum Frame<'a, V, const D: usize> {
    Children(std::slice::Iter<'a, ChildRef<V, D>>),
    Values(std::slice::Iter<'a, V>),
}

impl<'a, V, const D: usize> Frame<'a, V, D> {
    fn of(node: &'a Node<V, D>) -> Frame<'a, V, D> {
        match node {
            Node::Leaf { values } => Frame::Values(values.iter()),
            Node::Internal { children } => Frame::Children(children.iter()),
        }
    }
}

/// Lazy range-query iterator returned by
/// [`RTree::query`](crate::RTree::query).
///
/// Each call to `query` produces an independent iterator; no traversal
/// state is shared between them.
pub struct Query<'a, V, T, P, const D: usize> {
    translator: &'a T,
    predicate: P,
    stack: Vec<Frame<'a, V, D>>,
}

impl<'a, V, T, P, const D: usize> Query<'a, V, T, P, D> {
    pub(crate) fn new(
        root: Option<&'a Node<V, D>>,
        translator: &'a T,
        predicate: P,
    ) -> Query<'a, V, T, P, D> {
        Query {
            translator,
            predicate,
            stack: root.map(Frame::of).into_iter().collect(),
        }
    }
}

impl<'a, V, T, P, const D: usize> Iterator for Query<'a, V, T, P, D>
where
    T: Translator<V, D>,
    P: SpatialPredicate<D>,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        while let Some(frame) = self.stack.last_mut() {
            match frame {
                Frame::Values(values) => {
                    for value in values.by_ref() {
                        if self.predicate.accept_value(&self.translator.bounds(value)) {
                            return Some(value);
                        }
                    }
                    self.stack.pop();
                }
                Frame::Children(children) => {
                    let mut descend = None;
                    for child in children.by_ref() {
                        if self.predicate.accept_bounds(&child.bbox) {
                            descend = Some(&child.node);
                            break;
                        }
                    }
                    match descend {
                        Some(node) => self.stack.push(Frame::of(node)),
                        None => {
                            self.stack.pop();
                        }
                    }
                }
            }
        }
        None
    }
}

/// Whole-tree iterator returned by [`RTree::iter`](crate::RTree::iter).
pub type Iter<'a, V, T, const D: usize> = Query<'a, V, T, Everything, D>;

enum Pending<'a, V, const D: usize> {
    Node(&'a Node<V, D>),
    Value(&'a V),
}

struct QueueEntry<'a, V, const D: usize> {
    dist: OrderedFloat<f64>,
    pending: Pending<'a, V, D>,
}

impl<V, const D: usize> PartialEq for QueueEntry<'_, V, D> {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}

impl<V, const D: usize> Eq for QueueEntry<'_, V, D> {}

impl<V, const D: usize> PartialOrd for QueueEntry<'_, V, D> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<V, const D: usize> Ord for QueueEntry<'_, V, D> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reversed so the BinaryHeap pops the closest entry first.
        other.dist.cmp(&self.dist)
    }
}

/// Lazy nearest-neighbor iterator returned by
/// [`RTree::nearest`](crate::RTree::nearest).
///
/// Yields at most `k` values in non-decreasing distance from the query
/// point.
pub struct Nearest<'a, V, T, const D: usize> {
    translator: &'a T,
    point: [f64; D],
    heap: BinaryHeap<QueueEntry<'a, V, D>>,
    remaining: usize,
}

impl<'a, V, T, const D: usize> Nearest<'a, V, T, D>
where
    T: Translator<V, D>,
{
    pub(crate) fn new(
        root: Option<&'a Node<V, D>>,
        translator: &'a T,
        point: [f64; D],
        k: usize,
    ) -> Nearest<'a, V, T, D> {
        let mut heap = BinaryHeap::new();
        if k > 0 {
            if let Some(node) = root {
                heap.push(QueueEntry {
                    dist: OrderedFloat(0.0),
                    pending: Pending::Node(node),
                });
            }
        }
        Nearest {
            translator,
            point,
            heap,
            remaining: k,
        }
    }
}

impl<'a, V, T, const D: usize> Iterator for Nearest<'a, V, T, D>
where
    T: Translator<V, D>,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        if self.remaining == 0 {
            return None;
        }
        while let Some(entry) = self.heap.pop() {
            match entry.pending {
                Pending::Value(value) => {
                    self.remaining -= 1;
                    return Some(value);
                }
                Pending::Node(Node::Leaf { values }) => {
                    for value in values {
                        let key = self.translator.bounds(value);
                        self.heap.push(QueueEntry {
                            dist: OrderedFloat(key.min_dist_sq(&self.point)),
                            pending: Pending::Value(value),
                        });
                    }
                }
                Pending::Node(Node::Internal { children }) => {
                    for child in children {
                        self.heap.push(QueueEntry {
                            dist: OrderedFloat(child.bbox.min_dist_sq(&self.point)),
                            pending: Pending::Node(&child.node),
                        });
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::DefaultTranslator;

    fn leaf(boxes: &[BoundingBox<2>]) -> Node<BoundingBox<2>, 2> {
        Node::Leaf {
            values: boxes.to_vec(),
        }
    }

    fn sample_tree() -> Node<BoundingBox<2>, 2> {
        let left = vec![
            BoundingBox::new([0.0, 0.0], [1.0, 1.0]),
            BoundingBox::new([2.0, 2.0], [3.0, 3.0]),
        ];
        let right = vec![
            BoundingBox::new([8.0, 8.0], [9.0, 9.0]),
            BoundingBox::new([10.0, 10.0], [11.0, 11.0]),
        ];
        Node::Internal {
            children: vec![
                ChildRef {
                    bbox: BoundingBox::new([0.0, 0.0], [3.0, 3.0]),
                    node: leaf(&left),
                },
                ChildRef {
                    bbox: BoundingBox::new([8.0, 8.0], [11.0, 11.0]),
                    node: leaf(&right),
                },
            ],
        }
    }

    #[test]
    fn test_intersects_predicate() {
        let predicate = Intersects(BoundingBox::new([0.0, 0.0], [5.0, 5.0]));
        assert!(predicate.accept_bounds(&BoundingBox::new([4.0, 4.0], [6.0, 6.0])));
        assert!(!predicate.accept_bounds(&BoundingBox::new([6.0, 6.0], [7.0, 7.0])));
    }

    #[test]
    fn test_covered_by_predicate() {
        let predicate = CoveredBy(BoundingBox::new([0.0, 0.0], [5.0, 5.0]));
        // Partially intersecting subtrees may still hold covered values.
        assert!(predicate.accept_bounds(&BoundingBox::new([4.0, 4.0], [8.0, 8.0])));
        assert!(predicate.accept_value(&BoundingBox::new([1.0, 1.0], [2.0, 2.0])));
        assert!(!predicate.accept_value(&BoundingBox::new([4.0, 4.0], [6.0, 6.0])));
    }

    #[test]
    fn test_query_prunes_and_filters() {
        let tree = sample_tree();
        let predicate = Intersects(BoundingBox::new([2.5, 2.5], [9.0, 9.0]));
        let results: Vec<_> =
            Query::new(Some(&tree), &DefaultTranslator, predicate).collect();

        assert_eq!(results.len(), 2);
        assert!(results.contains(&&BoundingBox::new([2.0, 2.0], [3.0, 3.0])));
        assert!(results.contains(&&BoundingBox::new([8.0, 8.0], [9.0, 9.0])));
    }

    #[test]
    fn test_query_empty_tree() {
        let predicate = Intersects(BoundingBox::new([0.0, 0.0], [1.0, 1.0]));
        let mut query: Query<'_, BoundingBox<2>, _, _, 2> =
            Query::new(None, &DefaultTranslator, predicate);
        assert!(query.next().is_none());
    }

    #[test]
    fn test_query_restartable() {
        let tree = sample_tree();
        let predicate = Everything;
        let first: Vec<_> = Query::new(Some(&tree), &DefaultTranslator, predicate).collect();
        let second: Vec<_> = Query::new(Some(&tree), &DefaultTranslator, predicate).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_nearest_orders_by_distance() {
        let tree = sample_tree();
        let results: Vec<_> =
            Nearest::new(Some(&tree), &DefaultTranslator, [4.0, 4.0], 4).collect();

        assert_eq!(results.len(), 4);
        assert_eq!(results[0], &BoundingBox::new([2.0, 2.0], [3.0, 3.0]));
        assert_eq!(results[1], &BoundingBox::new([0.0, 0.0], [1.0, 1.0]));
        assert_eq!(results[2], &BoundingBox::new([8.0, 8.0], [9.0, 9.0]));
        assert_eq!(results[3], &BoundingBox::new([10.0, 10.0], [11.0, 11.0]));
    }

    #[test]
    fn test_nearest_stops_at_k() {
        let tree = sample_tree();
        let results: Vec<_> =
            Nearest::new(Some(&tree), &DefaultTranslator, [0.0, 0.0], 2).collect();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_nearest_zero_k_does_not_descend() {
        let tree = sample_tree();
        let mut nearest = Nearest::new(Some(&tree), &DefaultTranslator, [0.0, 0.0], 0);
        assert!(nearest.heap.is_empty());
        assert!(nearest.next().is_none());
    }

    #[test]
    fn test_nearest_empty_tree() {
        let mut nearest: Nearest<'_, BoundingBox<2>, _, 2> =
            Nearest::new(None, &DefaultTranslator, [0.0, 0.0], 3);
        assert!(nearest.next().is_none());
    }
}
