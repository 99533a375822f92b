//! # Veldt - In-Memory R-Tree Spatial Index
//!
//! This crate provides a dynamic, balanced R-tree for indexing values by
//! axis-aligned bounding boxes in any number of dimensions, with window
//! queries and k-nearest-neighbor search that prune whole subtrees instead
//! of scanning every stored value.
//!
//! ## Features
//!
//! - **Three insertion strategies**: [`Linear`], [`Quadratic`] and the
//!   default [`RStar`] with forced reinsertion, selected statically at
//!   construction time
//! - **Opaque values**: anything can be stored; a [`Translator`] extracts
//!   the bounding box and defines equality for removal
//! - **Lazy queries**: range queries and nearest-neighbor search are
//!   iterators that descend only into matching subtrees
//! - **Deletion with rebalancing**: underflowing nodes are dissolved and
//!   their entries reinserted, keeping the tree balanced under arbitrary
//!   insert/remove interleavings
//! - **Bulk loading**: batch construction ordered along a Hilbert curve
//!
//! ## Quick Start
//!
//! ```rust
//! use veldt::{BoundingBox, Intersects, RTree};
//!
//! let mut tree: RTree<BoundingBox<2>, 2> = RTree::new();
//! tree.insert(BoundingBox::new([0.0, 0.0], [1.0, 1.0]));
//! tree.insert(BoundingBox::new([2.0, 2.0], [3.0, 3.0]));
//! tree.insert(BoundingBox::new([8.0, 8.0], [9.0, 9.0]));
//!
//! // Window query: which boxes touch (0,0)-(4,4)?
//! let window = Intersects(BoundingBox::new([0.0, 0.0], [4.0, 4.0]));
//! assert_eq!(tree.query(window).count(), 2);
//!
//! // Nearest neighbor to a point.
//! let nearest: Vec<_> = tree.nearest([7.0, 7.0], 1).collect();
//! assert_eq!(nearest[0], &BoundingBox::new([8.0, 8.0], [9.0, 9.0]));
//! ```
//!
//! ## Storing Payloads
//!
//! `(BoundingBox, P)` pairs are [`Located`] at their box, so payloads need
//! no custom translator:
//!
//! ```rust
//! use veldt::{BoundingBox, RTree};
//!
//! let mut tree: RTree<(BoundingBox<2>, &str), 2> = RTree::new();
//! tree.insert((BoundingBox::from_point([12.5, 41.9]), "Rome"));
//! tree.insert((BoundingBox::from_point([2.35, 48.85]), "Paris"));
//!
//! let closest: Vec<_> = tree.nearest([3.0, 48.0], 1).collect();
//! assert_eq!(closest[0].1, "Paris");
//! ```
//!
//! ## Choosing a Strategy
//!
//! ```rust
//! use veldt::{BoundingBox, DefaultTranslator, Quadratic, RTree};
//!
//! let strategy = Quadratic::new(32, 12)?;
//! let mut tree: RTree<BoundingBox<2>, 2, DefaultTranslator, Quadratic> =
//!     RTree::with_strategy(strategy);
//! tree.insert(BoundingBox::new([0.0, 0.0], [1.0, 1.0]));
//! # Ok::<(), veldt::SpatialError>(())
//! ```
//!
//! One tree must not be mutated concurrently; wrap it in a lock to share it
//! across threads. Cloning a tree deep-copies every node.

// Spatial primitives
pub mod bounding_box;
pub mod error;
pub mod translator;

// Tree structure
pub mod node;
pub mod strategy;
pub mod tree;

// Queries and bulk-load ordering
pub mod hilbert;
pub mod query;

// Re-export the spatial primitives
pub use bounding_box::BoundingBox;
pub use error::{SpatialError, SpatialResult};
pub use translator::{DefaultTranslator, Located, Translator};

// Re-export the tree and its strategies
pub use strategy::{Linear, Quadratic, RStar, Strategy};
pub use tree::RTree;

// Re-export the query types
pub use query::{CoveredBy, Everything, Intersects, Iter, Nearest, Query, SpatialPredicate};
