#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use xnbcode::math::{Color, Vector3};
use xnbcode::{Content, SharedRef, TypeCatalog, Xnb, XnbOptions, compile_batch};

#[derive(Debug, Default, Clone, Content)]
struct BenchVertex {
    position: Vector3,
    color: Color,
    weights: Vec<f32>,
}

#[derive(Debug, Default, Clone, Content)]
struct BenchMaterial {
    name: String,
    tint: Color,
}

#[derive(Debug, Default, Clone, Content)]
struct BenchMesh {
    name: String,
    vertices: Vec<BenchVertex>,
    #[content(shared)]
    material: SharedRef<BenchMaterial>,
}

fn generate_mesh(vertex_count: usize, material: &SharedRef<BenchMaterial>) -> BenchMesh {
    let vertices = (0..vertex_count)
        .map(|i| BenchVertex {
            position: Vector3::new(i as f32, (i * 2) as f32, 0.5),
            color: Color::new((i % 256) as u8, 0, 255, 255),
            weights: vec![0.25; 4],
        })
        .collect();
    BenchMesh {
        name: format!("mesh_{vertex_count}"),
        vertices,
        material: material.clone(),
    }
}

fn shared_material() -> SharedRef<BenchMaterial> {
    SharedRef::from_value(BenchMaterial {
        name: "stone".into(),
        tint: Color::new(128, 128, 128, 255),
    })
}

// --- BENCHMARKS ---

fn bench_writers(c: &mut Criterion) {
    let vertex_count = 100_000;
    let catalog = TypeCatalog::new();
    let mesh = generate_mesh(vertex_count, &shared_material());
    let raw = XnbOptions::default().compress(false);
    let packed = XnbOptions::default().compress(true);

    println!("Writers vertex count: {}", vertex_count);

    let mut group = c.benchmark_group("Serialization Write");
    let size = raw.serialize(&catalog, &mesh).expect("Failed to compile").len();
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("xnb_compile_raw", |b| {
        b.iter(|| raw.serialize(&catalog, black_box(&mesh)).expect("Failed to compile"));
    });

    group.bench_function("xnb_compile_lz4", |b| {
        b.iter(|| packed.serialize(&catalog, black_box(&mesh)).expect("Failed to compile"));
    });

    group.finish();
}

fn bench_readers(c: &mut Criterion) {
    let vertex_count = 100_000;
    let catalog = TypeCatalog::new();
    let mesh = generate_mesh(vertex_count, &shared_material());

    let raw = XnbOptions::default()
        .compress(false)
        .serialize(&catalog, &mesh)
        .expect("Failed to compile");
    let packed = XnbOptions::default()
        .compress(true)
        .serialize(&catalog, &mesh)
        .expect("Failed to compile");

    println!("Readers vertex count: {}", vertex_count);
    println!("{}", Xnb::inspect_bytes(&packed).expect("Failed to inspect"));

    let mut group = c.benchmark_group("Deserialization Read");
    group.throughput(Throughput::Bytes(raw.len() as u64));

    group.bench_function("xnb_load_raw", |b| {
        b.iter(|| {
            let _mesh: BenchMesh = Xnb::load_bytes(&catalog, black_box(&raw)).expect("Failed to load");
        });
    });

    group.bench_function("xnb_load_lz4", |b| {
        b.iter(|| {
            let _mesh: BenchMesh =
                Xnb::load_bytes(&catalog, black_box(&packed)).expect("Failed to load");
        });
    });

    // Hot reload into a warm instance, reusing every vertex allocation.
    group.bench_function("xnb_reload_in_place", |b| {
        let mut live = mesh.clone();
        b.iter(|| {
            Xnb::load_into(&catalog, black_box(&raw), &mut live).expect("Failed to reload");
        });
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let catalog = TypeCatalog::new();
    let material = shared_material();
    let options = XnbOptions::default();

    let mut group = c.benchmark_group("Batch Compile");
    for containers in [8usize, 64] {
        let meshes: Vec<BenchMesh> = (0..containers)
            .map(|_| generate_mesh(10_000, &material))
            .collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(containers),
            &meshes,
            |b, meshes| {
                b.iter(|| compile_batch(&catalog, &options, black_box(meshes)));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_writers, bench_readers, bench_batch);
criterion_main!(benches);
