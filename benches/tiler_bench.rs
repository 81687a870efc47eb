use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mesh_partition::document::Node;
use mesh_partition::mesh_generation::tiled;
use mesh_partition::partitioning::{Chunk, Partitioner, SerialPartitioner};

fn bench_tiler(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiled");
    let plain = Node::from_json(r#"{"reorder": 0}"#).unwrap();
    let reordered = Node::new();
    for &n in &[4usize, 16, 32] {
        group.bench_with_input(BenchmarkId::new("2d", n), &n, |b, &n| {
            b.iter(|| tiled(n, n, 0, &plain).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("2d_reorder", n), &n, |b, &n| {
            b.iter(|| tiled(n, n, 0, &reordered).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("3d_reorder", n), &n, |b, &n| {
            b.iter(|| tiled(n, n, 4, &reordered).unwrap())
        });
    }
    group.finish();
}

fn bench_map_chunks(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let meshes: Vec<Node> = (0..64)
        .map(|_| {
            let n = rng.gen_range(1..6);
            tiled(n, n, 0, &Node::from_json(r#"{"reorder": 0}"#).unwrap()).unwrap()
        })
        .collect();
    let chunks: Vec<_> = meshes.iter().map(Chunk::borrowed).collect();
    let p = SerialPartitioner::new();
    let mut group = c.benchmark_group("redistribute");
    for &target in &[4usize, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(target), &target, |b, &t| {
            b.iter(|| p.redistribute(&chunks, t).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tiler, bench_map_chunks);
criterion_main!(benches);
