use bramm::{Boundary, GridMode, JoinOptions, Matcher, MatcherConfig, PointTable, RegularGrid};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geo::polygon;

fn france_like() -> Boundary {
    Boundary::from_polygon(polygon![
        (x: -4.8, y: 48.4),
        (x: -1.2, y: 43.3),
        (x: 3.1, y: 42.4),
        (x: 7.6, y: 43.8),
        (x: 8.2, y: 49.0),
        (x: 2.5, y: 51.1),
    ])
    .unwrap()
}

fn scattered_table(count: usize, seed: u64) -> PointTable {
    let mut state = seed;
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut table = PointTable::new(vec!["longitude".into(), "latitude".into()]);
    for _ in 0..count {
        let lon = -4.5 + 12.5 * next();
        let lat = 42.5 + 8.5 * next();
        table.push(vec![lon.into(), lat.into()]).unwrap();
    }
    table
}

fn benchmark_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");
    let grid = RegularGrid::new(france_like());

    for step in [0.5, 0.1, 0.05] {
        group.bench_with_input(BenchmarkId::new("inside_only", step), &step, |b, &step| {
            b.iter(|| {
                grid.retrieve_grid(black_box(step), GridMode::InsideOnly)
                    .unwrap()
            })
        });
    }

    group.bench_function("annotated_0.1", |b| {
        b.iter(|| grid.retrieve_grid(black_box(0.1), GridMode::Annotated).unwrap())
    });

    group.finish();
}

fn benchmark_nearest_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_join");
    let matcher = Matcher::new(MatcherConfig::default().with_km_threshold(10.0)).unwrap();
    let options = JoinOptions::new().want_leftovers(true);

    for size in [100usize, 1_000, 10_000] {
        let left = scattered_table(size, 1);
        let right = scattered_table(size, 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                matcher
                    .nearest_join(black_box(&left), black_box(&right), &options)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_grid, benchmark_nearest_join);
criterion_main!(benches);
