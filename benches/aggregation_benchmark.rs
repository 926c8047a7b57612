//! Benchmarks for the pure aggregation paths: category tree traversal and
//! the simulated structure reconciliation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use catalog_pulse::domain::category::{extract_leaf_slugs, resolve_path, Category};
use catalog_pulse::domain::metrics::{simulated_structure_distribution, structure_percentages};

/// Balanced tree with `breadth` children per node and the given depth.
fn build_tree(breadth: usize, depth: usize, prefix: &str) -> Vec<Category> {
    (0..breadth)
        .map(|i| {
            let slug = format!("{prefix}-{i}");
            Category {
                name: format!("Node {slug}"),
                slug: slug.clone(),
                icon: String::new(),
                children: if depth == 0 {
                    Vec::new()
                } else {
                    build_tree(breadth, depth - 1, &slug)
                },
            }
        })
        .collect()
}

fn bench_tree_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_traversal");

    for depth in [2usize, 3, 4] {
        let tree = build_tree(6, depth, "cat");
        group.bench_with_input(BenchmarkId::new("extract_leaf_slugs", depth), &tree, |b, tree| {
            b.iter(|| extract_leaf_slugs(black_box(tree)));
        });

        // Worst case: the target sits on the last path visited.
        let deepest = format!("cat-5{}", "-5".repeat(depth));
        group.bench_with_input(BenchmarkId::new("resolve_path_deepest", depth), &tree, |b, tree| {
            b.iter(|| resolve_path(black_box(tree), black_box(&deepest)));
        });
    }

    group.finish();
}

fn bench_structure_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("structure_simulation");

    for total in [10u32, 1_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::new("distribution", total),
            &total,
            |b, &total| {
                b.iter(|| simulated_structure_distribution(black_box("office-chairs"), total));
            },
        );
    }

    let distribution = simulated_structure_distribution("office-chairs", 100_000);
    group.bench_function("percentages", |b| {
        b.iter(|| structure_percentages(black_box(&distribution), 100_000));
    });

    group.finish();
}

criterion_group!(benches, bench_tree_traversal, bench_structure_simulation);
criterion_main!(benches);
