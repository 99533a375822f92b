use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

use veldt::{BoundingBox, Located, RTree};
use veldt_int_test::test_util::init_logging;

/// Clones left before the next one panics. `usize::MAX` means "never".
/// Process-global, so everything metered by it lives in this single test.
static CLONE_BUDGET: AtomicUsize = AtomicUsize::new(usize::MAX);

#[derive(Debug, PartialEq)]
struct Fragile {
    bbox: BoundingBox<2>,
    id: u32,
}

impl Clone for Fragile {
    fn clone(&self) -> Fragile {
        if CLONE_BUDGET.fetch_sub(1, Ordering::SeqCst) == 0 {
            panic!("clone budget exhausted");
        }
        Fragile {
            bbox: self.bbox,
            id: self.id,
        }
    }
}

impl Located<2> for Fragile {
    fn bounds(&self) -> BoundingBox<2> {
        self.bbox
    }
}

fn fragile_tree(count: u32) -> RTree<Fragile, 2> {
    let mut tree = RTree::new();
    for id in 0..count {
        let x = (id % 8) as f64 * 4.0;
        let y = (id / 8) as f64 * 4.0;
        tree.insert(Fragile {
            bbox: BoundingBox::new([x, y], [x + 1.0, y + 1.0]),
            id,
        });
    }
    tree
}

#[test]
fn test_failed_clone_leaves_source_untouched() {
    init_logging();

    // Inserts move values, so the budget only meters the clones below.
    let tree = fragile_tree(48);

    // A clone with enough budget copies everything.
    let copy = tree.clone();
    assert_eq!(copy.len(), tree.len());
    let mut original: Vec<u32> = tree.iter().map(|fragile| fragile.id).collect();
    let mut cloned: Vec<u32> = copy.iter().map(|fragile| fragile.id).collect();
    original.sort_unstable();
    cloned.sort_unstable();
    assert_eq!(original, cloned);
    drop(copy);

    // A clone that dies on its 11th value copy must never become observable.
    CLONE_BUDGET.store(10, Ordering::SeqCst);
    let result = catch_unwind(AssertUnwindSafe(|| tree.clone()));
    CLONE_BUDGET.store(usize::MAX, Ordering::SeqCst);
    assert!(result.is_err(), "the 11th clone must panic");

    // The source is intact and fully queryable.
    assert_eq!(tree.len(), 48);
    assert_eq!(tree.iter().count(), 48);
    let ids: Vec<u32> = tree
        .nearest([0.0, 0.0], 3)
        .map(|fragile| fragile.id)
        .collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], 0);
}
