//! Performance benchmarks for SortCopy
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sortcopy::config::SortConfig;
use sortcopy::core::SortEngine;
use std::path::Path;
use tempfile::TempDir;

const EXTENSIONS: [&str; 5] = ["txt", "jpg", "png", "md", "bin"];

/// Create `dirs` folders holding `files` files each, spread over a few extensions
fn create_tree(root: &Path, dirs: usize, files: usize, size: usize) {
    let payload: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();

    for d in 0..dirs {
        let dir = root.join(format!("dir_{}/nested_{}", d % 8, d));
        std::fs::create_dir_all(&dir).unwrap();

        for f in 0..files {
            let ext = EXTENSIONS[(d + f) % EXTENSIONS.len()];
            std::fs::write(dir.join(format!("file_{}_{}.{}", d, f, ext)), &payload).unwrap();
        }
    }
}

fn run_sort(source: &Path, output: &Path, max_walkers: Option<usize>) {
    let config = SortConfig {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        max_walkers,
        ..Default::default()
    };

    let report = SortEngine::new(config).execute().unwrap();
    black_box(report);
    std::fs::remove_dir_all(output).unwrap();
}

fn bench_sort_small_files(c: &mut Criterion) {
    let src_dir = TempDir::new().unwrap();
    let dst_dir = TempDir::new().unwrap();
    create_tree(src_dir.path(), 32, 20, 1024);

    let output = dst_dir.path().join("dist");
    let mut group = c.benchmark_group("sort_640_small_files");
    group.throughput(Throughput::Elements(640));

    group.bench_function("bounded_walkers", |b| {
        b.iter(|| run_sort(src_dir.path(), &output, Some(8)));
    });

    group.bench_function("unbounded_walkers", |b| {
        b.iter(|| run_sort(src_dir.path(), &output, None));
    });

    group.finish();
}

fn bench_tree_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_width");
    group.sample_size(10);

    for dirs in [8usize, 64, 256] {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        create_tree(src_dir.path(), dirs, 4, 512);
        let output = dst_dir.path().join("dist");

        group.bench_with_input(BenchmarkId::from_parameter(dirs), &dirs, |b, _| {
            b.iter(|| run_sort(src_dir.path(), &output, Some(64)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sort_small_files, bench_tree_width);
criterion_main!(benches);
