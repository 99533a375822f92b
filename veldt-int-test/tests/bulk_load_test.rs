use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use veldt::{BoundingBox, DefaultTranslator, Intersects, RStar, RTree};
use veldt_int_test::test_util::{brute_force_intersecting, init_logging, random_boxes};

#[test]
fn test_bulk_load_stores_everything() {
    init_logging();

    let mut rng = StdRng::seed_from_u64(8);
    let boxes = random_boxes(&mut rng, 600, 300.0, 10.0);

    let tree: RTree<BoundingBox<2>, 2> = RTree::bulk_load(boxes.clone());
    assert_eq!(tree.len(), boxes.len());

    let mut stored: Vec<_> = tree.iter().copied().collect();
    let mut expected = boxes;
    stored.sort();
    expected.sort();
    assert_eq!(stored, expected);
}

#[test]
fn test_bulk_load_queries_match_incremental_tree() {
    init_logging();

    let mut rng = StdRng::seed_from_u64(19);
    let boxes = random_boxes(&mut rng, 400, 200.0, 8.0);

    let bulk: RTree<BoundingBox<2>, 2> = RTree::bulk_load(boxes.clone());
    let mut incremental: RTree<BoundingBox<2>, 2> = RTree::new();
    for bbox in &boxes {
        incremental.insert(*bbox);
    }

    for _ in 0..20 {
        let x: f64 = rng.gen_range(0.0..200.0);
        let y: f64 = rng.gen_range(0.0..200.0);
        let window = BoundingBox::new([x, y], [x + 25.0, y + 25.0]);
        let expected = brute_force_intersecting(&boxes, &window);

        let mut from_bulk: Vec<_> = bulk.query(Intersects(window)).copied().collect();
        let mut from_incremental: Vec<_> =
            incremental.query(Intersects(window)).copied().collect();
        from_bulk.sort();
        from_incremental.sort();

        assert_eq!(from_bulk, expected);
        assert_eq!(from_incremental, expected);
    }
}

#[test]
fn test_bulk_load_hinted() {
    init_logging();

    let mut rng = StdRng::seed_from_u64(37);
    let boxes = random_boxes(&mut rng, 100, 80.0, 4.0);
    let entries: Vec<(BoundingBox<2>, BoundingBox<2>)> =
        boxes.iter().map(|bbox| (*bbox, *bbox)).collect();

    let tree: RTree<BoundingBox<2>, 2> =
        RTree::bulk_load_hinted(DefaultTranslator, RStar::default(), entries);
    assert_eq!(tree.len(), boxes.len());
}

#[test]
fn test_bulk_load_empty_and_single() {
    init_logging();

    let empty: RTree<BoundingBox<2>, 2> = RTree::bulk_load(Vec::new());
    assert!(empty.is_empty());
    assert_eq!(empty.height(), 0);

    let single: RTree<BoundingBox<2>, 2> =
        RTree::bulk_load(vec![BoundingBox::new([1.0, 1.0], [2.0, 2.0])]);
    assert_eq!(single.len(), 1);
    assert_eq!(single.height(), 1);
}
