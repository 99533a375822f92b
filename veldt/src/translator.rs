//! Extraction of indexable keys from stored values.
//!
//! A [`Translator`] tells the tree two things about the opaque values it
//! stores: where a value is ([`Translator::bounds`]) and when two values are
//! the same for deletion purposes ([`Translator::equals`]). Values that
//! already know their own location implement [`Located`] and get the
//! zero-sized [`DefaultTranslator`] for free.

use crate::bounding_box::BoundingBox;

/// Maps stored values to their indexable bounding boxes and defines value
/// equality for removal.
///
/// `bounds` must be deterministic for as long as a value is stored: the tree
/// caches derived boxes in its internal nodes and a value whose key drifts
/// becomes unfindable.
pub trait Translator<V, const D: usize> {
    /// Returns the bounding box the value is indexed under.
    fn bounds(&self, value: &V) -> BoundingBox<D>;

    /// Checks whether a stored value matches the value passed to `remove`.
    fn equals(&self, a: &V, b: &V) -> bool;
}

/// Values that carry their own bounding box.
pub trait Located<const D: usize> {
    /// Returns the bounding box of this value.
    fn bounds(&self) -> BoundingBox<D>;
}

impl<const D: usize> Located<D> for BoundingBox<D> {
    fn bounds(&self) -> BoundingBox<D> {
        *self
    }
}

impl<const D: usize> Located<D> for [f64; D] {
    fn bounds(&self) -> BoundingBox<D> {
        BoundingBox::from_point(*self)
    }
}

/// A `(key, payload)` pair is located at its key.
impl<P, const D: usize> Located<D> for (BoundingBox<D>, P) {
    fn bounds(&self) -> BoundingBox<D> {
        self.0
    }
}

/// Translator for values that are [`Located`] and comparable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultTranslator;

impl<V, const D: usize> Translator<V, D> for DefaultTranslator
where
    V: Located<D> + PartialEq,
{
    fn bounds(&self, value: &V) -> BoundingBox<D> {
        value.bounds()
    }

    fn equals(&self, a: &V, b: &V) -> bool {
        a == b
    }
}
