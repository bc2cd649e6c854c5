//! Benchmarks for mesh operations.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use leaflet::prelude::*;
use nalgebra::Point3;

/// Periodic `n x n` sheet with a gentle height modulation so that the
/// curvature pass has work to do.
fn create_sheet(n: usize) -> (PeriodicBox, Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let idx = |i: usize, j: usize| (j % n) * n + i % n;
    let k = 2.0 * std::f64::consts::PI / n as f64;

    let mut vertices = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            let z = 10.0 + 0.5 * (k * i as f64).sin() * (k * j as f64).cos();
            vertices.push(Point3::new(i as f64, j as f64, z));
        }
    }

    let mut faces = Vec::with_capacity(n * n * 2);
    for j in 0..n {
        for i in 0..n {
            faces.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
            faces.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }

    let pbc = PeriodicBox::new(n as f64, n as f64, 20.0).unwrap();
    (pbc, vertices, faces)
}

fn create_mesh(n: usize) -> MembraneMesh {
    let (pbc, vertices, faces) = create_sheet(n);
    let mut mesh = build_from_triangles(pbc, &vertices, &faces).unwrap();
    update_geometry(&mut mesh).unwrap();
    mesh
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (pbc, vertices, faces) = create_sheet(64);
    c.bench_function("build_sheet_64x64", |b| {
        b.iter(|| build_from_triangles(pbc, &vertices, &faces).unwrap())
    });
}

fn bench_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_geometry");
    for n in [32, 64, 128] {
        let mesh = create_mesh(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &mesh, |b, mesh| {
            b.iter_batched(
                || mesh.clone(),
                |mut m| update_geometry(&mut m).unwrap(),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_subdivide(c: &mut Criterion) {
    let mesh = create_mesh(32);
    c.bench_function("subdivide_sheet_32x32_x2", |b| {
        b.iter(|| subdivide(&mesh, &SubdivideOptions::new(2)).unwrap())
    });
}

fn bench_flip_pass(c: &mut Criterion) {
    let mesh = create_mesh(64);
    let options = FlipOptions::new(FlipCriterion::Delaunay);
    c.bench_function("delaunay_flip_pass_64x64", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut m| flip_pass(&mut m, &options).unwrap(),
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_project(c: &mut Criterion) {
    let mesh = create_mesh(128);
    let options = ProjectOptions::default();
    c.bench_function("project_sheet_128x128", |b| {
        b.iter(|| project(&mesh, &options).unwrap())
    });
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_geometry,
    bench_subdivide,
    bench_flip_pass,
    bench_project
);
criterion_main!(benches);
