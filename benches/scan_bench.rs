use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::fs;
use std::hint::black_box;
use std::path::Path;
use tempfile::tempdir;
use witness::fingerprint::Fingerprinter;
use witness::scanner::{ScanOptions, Snapshotter};

fn create_tree(dir: &Path, dirs: usize, files_per_dir: usize) {
    for d in 0..dirs {
        let sub = dir.join(format!("dir_{d}"));
        fs::create_dir_all(&sub).unwrap();
        for f in 0..files_per_dir {
            let content = format!("File {f} in directory {d} with some content to hash");
            fs::write(sub.join(format!("file_{f}.txt")), content).unwrap();
        }
    }
}

fn benchmark_fingerprinting(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let small_file = dir.path().join("small.txt");
    let medium_file = dir.path().join("medium.txt");
    let large_file = dir.path().join("large.txt");

    fs::write(&small_file, vec![b'a'; 1024]).unwrap(); // 1KB
    fs::write(&medium_file, vec![b'b'; 1024 * 100]).unwrap(); // 100KB
    fs::write(&large_file, vec![b'c'; 1024 * 1024 * 10]).unwrap(); // 10MB, streamed

    let fingerprinter = Fingerprinter::default();
    let mut group = c.benchmark_group("fingerprint");

    group.bench_function("digest_1kb", |b| {
        b.iter(|| fingerprinter.digest(black_box(&small_file)));
    });

    group.bench_function("digest_100kb", |b| {
        b.iter(|| fingerprinter.digest(black_box(&medium_file)));
    });

    group.bench_function("digest_10mb", |b| {
        b.iter(|| fingerprinter.digest(black_box(&large_file)));
    });

    group.finish();
}

fn benchmark_scanning(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for (dirs, files) in [(10, 10), (20, 50), (50, 100)] {
        let dir = tempdir().unwrap();
        create_tree(dir.path(), dirs, files);
        let snapshotter = Snapshotter::new(ScanOptions::default());

        group.bench_with_input(
            BenchmarkId::new("full", dirs * files),
            dir.path(),
            |b, root| b.iter(|| snapshotter.scan(black_box(root)).unwrap()),
        );

        let previous = snapshotter.scan(dir.path()).unwrap();
        group.bench_with_input(
            BenchmarkId::new("reusing", dirs * files),
            dir.path(),
            |b, root| b.iter(|| snapshotter.scan_reusing(black_box(root), &previous).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_fingerprinting, benchmark_scanning);
criterion_main!(benches);
