use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A `D`-dimensional axis-aligned bounding box.
///
/// `BoundingBox` defines a rectangular region by its minimum and maximum
/// corners, one `(min, max)` pair per dimension. It is the key type of the
/// index: every stored value maps to a bounding box through its translator,
/// and every internal tree node carries the exact bounding box of its
/// subtree.
///
/// Coordinates are `f64`. A valid box satisfies `min[i] <= max[i]` for every
/// dimension; a point is a box with `min == max`.
///
/// # Examples
///
/// ```rust
/// use veldt::BoundingBox;
///
/// let bbox = BoundingBox::new([0.0, 0.0], [100.0, 100.0]);
/// assert!(bbox.contains(&BoundingBox::from_point([50.0, 50.0])));
/// assert_eq!(bbox.area(), 10_000.0);
/// ```
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BoundingBox<const D: usize> {
    /// Minimum corner, one coordinate per dimension.
    pub min: [f64; D],
    /// Maximum corner, one coordinate per dimension.
    pub max: [f64; D],
}

impl<const D: usize> Eq for BoundingBox<D> {}

impl<const D: usize> PartialOrd for BoundingBox<D> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<const D: usize> Ord for BoundingBox<D> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        for i in 0..D {
            let ord = self.min[i].total_cmp(&other.min[i]);
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        for i in 0..D {
            let ord = self.max[i].total_cmp(&other.max[i]);
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    }
}

impl<const D: usize> std::hash::Hash for BoundingBox<D> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for coord in self.min.iter().chain(self.max.iter()) {
            coord.to_bits().hash(state);
        }
    }
}

impl<const D: usize> std::fmt::Display for BoundingBox<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoundingBox({:?}, {:?})", self.min, self.max)
    }
}

impl<const D: usize> BoundingBox<D> {
    /// Creates a new bounding box from its minimum and maximum corners.
    pub fn new(min: [f64; D], max: [f64; D]) -> BoundingBox<D> {
        BoundingBox { min, max }
    }

    /// Creates a degenerate box covering a single point.
    pub fn from_point(point: [f64; D]) -> BoundingBox<D> {
        BoundingBox {
            min: point,
            max: point,
        }
    }

    /// Returns the identity of [`expand`](Self::expand): a box that contains
    /// nothing and is absorbed by any union.
    pub fn empty() -> BoundingBox<D> {
        BoundingBox {
            min: [f64::INFINITY; D],
            max: [f64::NEG_INFINITY; D],
        }
    }

    /// Checks if this box contains nothing (`min > max` in some dimension).
    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.min[i] > self.max[i])
    }

    /// Checks if this box is valid (`min <= max` in every dimension).
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self.min[i] <= self.max[i])
    }

    /// Checks if this box is a single point (zero extent everywhere).
    pub fn is_point(&self) -> bool {
        (0..D).all(|i| self.min[i] == self.max[i])
    }

    /// Returns the extent of the box along one dimension.
    pub fn extent(&self, dim: usize) -> f64 {
        self.max[dim] - self.min[dim]
    }

    /// Returns the area (hyper-volume) of the box, 0 for an empty box.
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (0..D).map(|i| self.extent(i)).product()
    }

    /// Returns the sum of the edge lengths, the margin measure used by the
    /// R* split axis selection. 0 for an empty box.
    pub fn margin(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (0..D).map(|i| self.extent(i)).sum()
    }

    /// Returns the center point of the box.
    pub fn center(&self) -> [f64; D] {
        let mut c = [0.0; D];
        for i in 0..D {
            c[i] = (self.min[i] + self.max[i]) / 2.0;
        }
        c
    }

    /// Checks if this box intersects another (shared boundaries count).
    pub fn intersects(&self, other: &BoundingBox<D>) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    /// Checks if this box fully contains another.
    pub fn contains(&self, other: &BoundingBox<D>) -> bool {
        (0..D).all(|i| self.min[i] <= other.min[i] && self.max[i] >= other.max[i])
    }

    /// Checks if this box contains a point.
    pub fn contains_point(&self, point: &[f64; D]) -> bool {
        (0..D).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }

    /// Returns the smallest box enclosing both boxes.
    pub fn union(&self, other: &BoundingBox<D>) -> BoundingBox<D> {
        let mut merged = *self;
        merged.expand(other);
        merged
    }

    /// Grows this box in place to enclose another.
    pub fn expand(&mut self, other: &BoundingBox<D>) {
        for i in 0..D {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    /// Returns the area of the intersection of two boxes, 0 when disjoint.
    pub fn intersection_area(&self, other: &BoundingBox<D>) -> f64 {
        let mut area = 1.0;
        for i in 0..D {
            let lo = self.min[i].max(other.min[i]);
            let hi = self.max[i].min(other.max[i]);
            if hi < lo {
                return 0.0;
            }
            area *= hi - lo;
        }
        area
    }

    /// Returns how much this box's area would grow to also enclose `other`.
    pub fn enlargement(&self, other: &BoundingBox<D>) -> f64 {
        self.union(other).area() - self.area()
    }

    /// Returns the squared distance from a point to the nearest point of the
    /// box, 0 if the point lies inside.
    ///
    /// This is the lower-bound distance of the nearest-neighbor search: it
    /// never exceeds the true distance to anything enclosed by the box.
    pub fn min_dist_sq(&self, point: &[f64; D]) -> f64 {
        let mut dist = 0.0;
        for i in 0..D {
            let clamped = point[i].clamp(self.min[i], self.max[i]);
            let d = point[i] - clamped;
            dist += d * d;
        }
        dist
    }
}

// Arrays of generic length have no serde impls, so the box is encoded
// through coordinate sequences and the length is checked on the way back in.
impl<const D: usize> Serialize for BoundingBox<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BoundingBox", 2)?;
        state.serialize_field("min", &self.min[..])?;
        state.serialize_field("max", &self.max[..])?;
        state.end()
    }
}

impl<'de, const D: usize> Deserialize<'de> for BoundingBox<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        #[derive(Deserialize)]
        struct Raw {
            min: Vec<f64>,
            max: Vec<f64>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let min: [f64; D] = raw
            .min
            .try_into()
            .map_err(|_| De::Error::custom(format!("expected {} min coordinates", D)))?;
        let max: [f64; D] = raw
            .max
            .try_into()
            .map_err(|_| De::Error::custom(format!("expected {} max coordinates", D)))?;
        Ok(BoundingBox { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let bbox = BoundingBox::new([1.0, 2.0], [3.0, 4.0]);
        assert_eq!(bbox.min, [1.0, 2.0]);
        assert_eq!(bbox.max, [3.0, 4.0]);
    }

    #[test]
    fn test_from_point() {
        let bbox = BoundingBox::from_point([5.0, 6.0]);
        assert!(bbox.is_point());
        assert_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn test_empty_identity() {
        let mut empty = BoundingBox::<2>::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.area(), 0.0);
        assert_eq!(empty.margin(), 0.0);

        let bbox = BoundingBox::new([1.0, 1.0], [2.0, 3.0]);
        empty.expand(&bbox);
        assert_eq!(empty, bbox);
    }

    #[test]
    fn test_extent_area_margin() {
        let bbox = BoundingBox::new([0.0, 0.0], [10.0, 5.0]);
        assert_eq!(bbox.extent(0), 10.0);
        assert_eq!(bbox.extent(1), 5.0);
        assert_eq!(bbox.area(), 50.0);
        assert_eq!(bbox.margin(), 15.0);
    }

    #[test]
    fn test_center() {
        let bbox = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);
        assert_eq!(bbox.center(), [5.0, 5.0]);

        let bbox = BoundingBox::new([-10.0, -5.0], [10.0, 5.0]);
        assert_eq!(bbox.center(), [0.0, 0.0]);
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);
        let b = BoundingBox::new([5.0, 5.0], [15.0, 15.0]);
        let c = BoundingBox::new([20.0, 20.0], [30.0, 30.0]);
        let touching = BoundingBox::new([10.0, 10.0], [20.0, 20.0]);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&touching));
        assert!(a.intersects(&a));
    }

    #[test]
    fn test_contains() {
        let outer = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);
        let inner = BoundingBox::new([2.0, 2.0], [8.0, 8.0]);
        let partial = BoundingBox::new([5.0, 5.0], [15.0, 15.0]);

        assert!(outer.contains(&inner));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&partial));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn test_contains_point() {
        let bbox = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);
        assert!(bbox.contains_point(&[5.0, 5.0]));
        assert!(bbox.contains_point(&[0.0, 0.0]));
        assert!(bbox.contains_point(&[10.0, 10.0]));
        assert!(!bbox.contains_point(&[-1.0, 5.0]));
        assert!(!bbox.contains_point(&[5.0, 11.0]));
    }

    #[test]
    fn test_union_expand() {
        let a = BoundingBox::new([0.0, 0.0], [5.0, 5.0]);
        let b = BoundingBox::new([3.0, 3.0], [10.0, 10.0]);

        let union = a.union(&b);
        assert_eq!(union, BoundingBox::new([0.0, 0.0], [10.0, 10.0]));

        let mut c = a;
        c.expand(&b);
        assert_eq!(c, union);
    }

    #[test]
    fn test_intersection_area() {
        let a = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);
        let b = BoundingBox::new([5.0, 5.0], [15.0, 15.0]);
        let c = BoundingBox::new([20.0, 20.0], [30.0, 30.0]);

        assert_eq!(a.intersection_area(&b), 25.0);
        assert_eq!(b.intersection_area(&a), 25.0);
        assert_eq!(a.intersection_area(&c), 0.0);
        assert_eq!(a.intersection_area(&a), 100.0);
    }

    #[test]
    fn test_enlargement() {
        let a = BoundingBox::new([0.0, 0.0], [4.0, 4.0]);
        let inside = BoundingBox::new([1.0, 1.0], [2.0, 2.0]);
        let outside = BoundingBox::new([4.0, 0.0], [8.0, 4.0]);

        assert_eq!(a.enlargement(&inside), 0.0);
        assert_eq!(a.enlargement(&outside), 16.0);
    }

    #[test]
    fn test_min_dist_sq() {
        let bbox = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);

        // Inside and on the boundary.
        assert_eq!(bbox.min_dist_sq(&[5.0, 5.0]), 0.0);
        assert_eq!(bbox.min_dist_sq(&[0.0, 10.0]), 0.0);

        // Straight out along one axis.
        assert_eq!(bbox.min_dist_sq(&[13.0, 5.0]), 9.0);

        // Diagonal from a corner.
        assert_eq!(bbox.min_dist_sq(&[13.0, 14.0]), 25.0);
    }

    #[test]
    fn test_one_dimensional() {
        let a = BoundingBox::new([0.0], [10.0]);
        let b = BoundingBox::new([5.0], [15.0]);
        assert!(a.intersects(&b));
        assert_eq!(a.area(), 10.0);
        assert_eq!(a.intersection_area(&b), 5.0);
        assert_eq!(a.min_dist_sq(&[12.0]), 4.0);
    }

    #[test]
    fn test_ordering() {
        let a = BoundingBox::new([1.0, 2.0], [3.0, 4.0]);
        let b = BoundingBox::new([2.0, 2.0], [3.0, 4.0]);
        let c = BoundingBox::new([1.0, 3.0], [3.0, 4.0]);

        assert!(a < b);
        assert!(a < c);
        assert!(b > a);
    }

    #[test]
    fn test_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(BoundingBox::new([1.0, 2.0], [3.0, 4.0]));

        assert!(set.contains(&BoundingBox::new([1.0, 2.0], [3.0, 4.0])));
        assert!(!set.contains(&BoundingBox::new([5.0, 6.0], [7.0, 8.0])));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let bbox = BoundingBox::new([1.5, 2.5], [3.5, 4.5]);
        let json = serde_json::to_string(&bbox).unwrap();
        let back: BoundingBox<2> = serde_json::from_str(&json).unwrap();
        assert_eq!(bbox, back);
    }

    #[test]
    fn test_deserialization_wrong_dimension() {
        let json = r#"{"min":[0.0,0.0,0.0],"max":[1.0,1.0,1.0]}"#;
        let result: Result<BoundingBox<2>, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        let bbox = BoundingBox::new([1.0, 2.0], [3.0, 4.0]);
        assert_eq!(format!("{}", bbox), "BoundingBox([1.0, 2.0], [3.0, 4.0])");
    }
}
