//! The tree node model.
//!
//! A node is either a leaf holding stored values or an internal node holding
//! `(bounding box, child)` pairs. Children are owned by value inside their
//! parent's vector: the tree is strict, no node is ever referenced from two
//! places, and dropping a node drops its whole subtree.

use crate::bounding_box::BoundingBox;
use crate::translator::Translator;

/// A child entry of an internal node: the exact bounding box of `node`'s
/// subtree, paired with the owned node.
#[derive(Debug, Clone)]
pub struct ChildRef<V, const D: usize> {
    /// Minimum bounding box of everything reachable through `node`.
    pub bbox: BoundingBox<D>,
    /// The owned child node.
    pub node: Node<V, D>,
}

/// A node of the R-tree.
#[derive(Debug, Clone)]
pub enum Node<V, const D: usize> {
    /// Leaf node holding stored values.
    Leaf { values: Vec<V> },
    /// Internal node holding child subtrees with their bounding boxes.
    Internal { children: Vec<ChildRef<V, D>> },
}

impl<V, const D: usize> Node<V, D> {
    /// Number of entries held directly by this node.
    pub fn len(&self) -> usize {
        match self {
            Node::Leaf { values } => values.len(),
            Node::Internal { children } => children.len(),
        }
    }

    /// Checks if this node holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Computes the exact bounding box of this node's entries.
    ///
    /// Internal nodes fold their cached child boxes; leaves ask the
    /// translator for each value's key.
    pub fn bounds<T: Translator<V, D>>(&self, translator: &T) -> BoundingBox<D> {
        let mut bbox = BoundingBox::empty();
        match self {
            Node::Leaf { values } => {
                for value in values {
                    bbox.expand(&translator.bounds(value));
                }
            }
            Node::Internal { children } => {
                for child in children {
                    bbox.expand(&child.bbox);
                }
            }
        }
        bbox
    }

    /// Height of the subtree rooted here; a leaf has height 1.
    ///
    /// All leaves of a balanced tree sit at the same depth, so following the
    /// first child is enough.
    pub fn height(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { children } => {
                1 + children.first().map_or(0, |child| child.node.height())
            }
        }
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

    #[test]
    fn test_leaf_len_and_bounds() {
        let node = leaf(&[
            BoundingBox::new([0.0, 0.0], [1.0, 1.0]),
            BoundingBox::new([4.0, 4.0], [5.0, 5.0]),
        ]);

        assert_eq!(node.len(), 2);
        assert!(node.is_leaf());
        assert_eq!(node.height(), 1);
        assert_eq!(
            node.bounds(&DefaultTranslator),
            BoundingBox::new([0.0, 0.0], [5.0, 5.0])
        );
    }

    #[test]
    fn test_internal_bounds_and_height() {
        let a = leaf(&[BoundingBox::new([0.0, 0.0], [1.0, 1.0])]);
        let b = leaf(&[BoundingBox::new([8.0, 8.0], [9.0, 9.0])]);
        let node = Node::Internal {
            children: vec![
                ChildRef {
                    bbox: BoundingBox::new([0.0, 0.0], [1.0, 1.0]),
                    node: a,
                },
                ChildRef {
                    bbox: BoundingBox::new([8.0, 8.0], [9.0, 9.0]),
                    node: b,
                },
            ],
        };

        assert_eq!(node.len(), 2);
        assert!(!node.is_leaf());
        assert_eq!(node.height(), 2);
        assert_eq!(
            node.bounds(&DefaultTranslator),
            BoundingBox::new([0.0, 0.0], [9.0, 9.0])
        );
    }

    #[test]
    fn test_empty_leaf() {
        let node: Node<BoundingBox<2>, 2> = Node::Leaf { values: Vec::new() };
        assert!(node.is_empty());
        assert!(node.bounds(&DefaultTranslator).is_empty());
    }
}
