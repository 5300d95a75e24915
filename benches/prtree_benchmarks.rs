use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geo::{Coord, coord};
use georewrite::{GeoRewriteError, PrTreeIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstar::{AABB, RTree, RTreeObject};

#[derive(Clone)]
struct Item {
    id: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl RTreeObject for Item {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

fn corners(item: &Item) -> Result<[Coord<f64>; 2], GeoRewriteError> {
    Ok([
        coord! { x: item.min[0], y: item.min[1] },
        coord! { x: item.max[0], y: item.max[1] },
    ])
}

fn random_items(n: usize) -> Vec<Item> {
    let mut rng = StdRng::seed_from_u64(233);
    (0..n)
        .map(|id| {
            let x = rng.gen_range(100.0..120.0);
            let y = rng.gen_range(20.0..30.0);
            // Half points, half short segments.
            let (w, h) = if id % 2 == 0 {
                (0.0, 0.0)
            } else {
                (rng.gen_range(0.0..0.2), rng.gen_range(0.0..0.2))
            };
            Item {
                id,
                min: [x, y],
                max: [x + w, y + h],
            }
        })
        .collect()
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(20);

    for &n in &[1_000usize, 10_000, 100_000] {
        let items = random_items(n);

        group.bench_with_input(BenchmarkId::new("prtree", n), &items, |b, items| {
            b.iter(|| PrTreeIndex::try_new(black_box(items.clone()), corners).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("rstar_bulk_load", n), &items, |b, items| {
            b.iter(|| RTree::bulk_load(black_box(items.clone())))
        });
    }

    group.finish();
}

fn benchmark_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    let items = random_items(100_000);
    let prtree = PrTreeIndex::try_new(items.clone(), corners).unwrap();
    let rstar = RTree::bulk_load(items);

    for &(label, window) in &[
        ("small", [110.0, 25.0, 110.5, 25.5]),
        ("medium", [110.0, 25.0, 115.0, 28.0]),
        ("full", [100.0, 20.0, 120.0, 30.0]),
    ] {
        group.bench_with_input(BenchmarkId::new("prtree", label), &window, |b, w| {
            b.iter(|| {
                let mut hits = 0usize;
                prtree
                    .query_env_intersect(w[0], w[1], w[2], w[3], |item| hits += item.id & 1)
                    .unwrap();
                black_box(hits)
            })
        });

        group.bench_with_input(BenchmarkId::new("rstar", label), &window, |b, w| {
            let aabb = AABB::from_corners([w[0], w[1]], [w[2], w[3]]);
            b.iter(|| {
                let hits: usize = rstar
                    .locate_in_envelope_intersecting(&aabb)
                    .map(|item| item.id & 1)
                    .sum();
                black_box(hits)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_build, benchmark_query);
criterion_main!(benches);
