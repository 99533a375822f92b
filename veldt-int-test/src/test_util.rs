//! Shared helpers for the integration tests.

use std::sync::Once;

use rand::rngs::StdRng;
use rand::Rng;
use veldt::BoundingBox;

static INIT: Once = Once::new();

/// Initializes logging once for the whole test binary.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Generates `count` random boxes inside `[0, extent)^2` with edges up to
/// `max_edge`.
pub fn random_boxes(
    rng: &mut StdRng,
    count: usize,
    extent: f64,
    max_edge: f64,
) -> Vec<BoundingBox<2>> {
    (0..count)
        .map(|_| {
            let x: f64 = rng.gen_range(0.0..extent);
            let y: f64 = rng.gen_range(0.0..extent);
            let w: f64 = rng.gen_range(0.0..max_edge);
            let h: f64 = rng.gen_range(0.0..max_edge);
            BoundingBox::new([x, y], [x + w, y + h])
        })
        .collect()
}

/// Reference range query: every box intersecting the window.
pub fn brute_force_intersecting(
    boxes: &[BoundingBox<2>],
    window: &BoundingBox<2>,
) -> Vec<BoundingBox<2>> {
    let mut hits: Vec<_> = boxes
        .iter()
        .filter(|bbox| bbox.intersects(window))
        .copied()
        .collect();
    hits.sort();
    hits
}

/// Reference k-NN: the `k` smallest point-to-box distances, ascending.
pub fn brute_force_nearest_distances(
    boxes: &[BoundingBox<2>],
    point: [f64; 2],
    k: usize,
) -> Vec<f64> {
    let mut distances: Vec<f64> = boxes.iter().map(|bbox| bbox.min_dist_sq(&point)).collect();
    distances.sort_by(|a, b| a.total_cmp(b));
    distances.truncate(k);
    distances
}
