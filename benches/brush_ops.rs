//! Benchmarks for brush building and map writing.

use criterion::{criterion_group, criterion_main, Criterion};
use brushsmith::prelude::*;
use nalgebra::{Point2, Point3};

/// A wavy terrain grid of `n` x `n` quads with planar UVs.
fn create_terrain_mesh(n: usize) -> PolyMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut uvs = Vec::with_capacity((n + 1) * (n + 1));
    let mut polygons = Vec::with_capacity(n * n);

    for j in 0..=n {
        for i in 0..=n {
            let height = ((i as f64) * 0.7).sin() * 8.0 + ((j as f64) * 0.4).cos() * 8.0;
            vertices.push(Point3::new(i as f64 * 32.0, j as f64 * 32.0, height));
            uvs.push(Point2::new(i as f64 / n as f64, j as f64 / n as f64));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;
            let corners = vec![v00, v10, v11, v01];
            let face_uvs = corners.iter().map(|&v| uvs[v]).collect();
            polygons.push(PolygonInput::new(corners).with_uvs(face_uvs).with_material(0));
        }
    }

    build_mesh(&vertices, &polygons).unwrap()
}

fn bench_strategies(c: &mut Criterion) {
    let mesh = create_terrain_mesh(32);
    let params = BuildParams::default().with_grid(1.0);

    let strategies = [
        Strategy::Brush,
        Strategy::Faces { depth: 8.0 },
        Strategy::Prisms { depth: 8.0 },
        Strategy::Soup { depth: 8.0 },
        Strategy::Miter { depth: 8.0 },
    ];
    for strategy in strategies {
        c.bench_function(&format!("build_{}_32x32", strategy.name()), |b| {
            b.iter(|| build(mesh.clone(), &strategy, &params));
        });
    }
}

fn bench_miter_scaling(c: &mut Criterion) {
    let params = BuildParams::default().with_grid(1.0);
    let strategy = Strategy::Miter { depth: 8.0 };
    for n in [16, 64] {
        let mesh = create_terrain_mesh(n);
        c.bench_function(&format!("shell_offsets_{}x{}", n, n), |b| {
            b.iter(|| mesh.shell_offsets());
        });
        c.bench_function(&format!("build_miter_{}x{}", n, n), |b| {
            b.iter(|| build(mesh.clone(), &strategy, &params));
        });
    }
}

fn bench_write(c: &mut Criterion) {
    let mut scene = Scene::new();
    scene.objects.push(
        SceneObject::new("terrain", create_terrain_mesh(32))
            .with_materials(vec![Material::new("grass").with_texel(TexelSize::new(128.0, 128.0))]),
    );

    for format in [
        TextureFormat::Standard,
        TextureFormat::Valve,
        TextureFormat::BrushPrimitives,
    ] {
        let options = ExportOptions::default()
            .with_strategy(Strategy::Soup { depth: 8.0 })
            .with_texture_format(format);
        let writer = MapWriter::new(options).unwrap();
        c.bench_function(&format!("write_soup_{:?}", format), |b| {
            b.iter(|| writer.write_string(&scene));
        });
    }
}

criterion_group!(benches, bench_strategies, bench_miter_scaling, bench_write);
criterion_main!(benches);
