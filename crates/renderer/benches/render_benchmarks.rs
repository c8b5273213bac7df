//! Benchmarks for the renderer crate - field rasterisation and full renders.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jet_common::Region;
use projection::{MapProjection, ProjectionKind};
use renderer::gradient::{render_field, Colormap};
use renderer::{MapRenderer, OverlayKind, RenderConfig};
use test_utils::synthetic_wind_grid;

fn bench_render_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_field");
    let grid = synthetic_wind_grid(0.75);
    let speeds = grid.speeds(3.0);
    let lut = Colormap::jetstream().lut();
    let region = Region::Global.bbox();

    for kind in [ProjectionKind::Cyl, ProjectionKind::Merc] {
        let proj = MapProjection::for_region(kind, &region).unwrap();
        for (w, h) in [(432, 216), (864, 432)] {
            group.throughput(Throughput::Elements((w * h) as u64));
            group.bench_with_input(
                BenchmarkId::new(kind.to_string(), format!("{}x{}", w, h)),
                &(w, h),
                |b, &(w, h)| {
                    b.iter(|| {
                        render_field(
                            black_box(&grid),
                            black_box(&speeds),
                            &proj,
                            w,
                            h,
                            &lut,
                            30.0,
                            220.0,
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_full_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_render");
    group.sample_size(20);
    let grid = synthetic_wind_grid(0.75);
    let speeds = grid.speeds(3.0);
    let region = Region::Global.bbox();

    for overlay in [OverlayKind::None, OverlayKind::Barbs] {
        let renderer = MapRenderer::new(RenderConfig {
            overlay,
            ..Default::default()
        })
        .unwrap();
        group.bench_function(BenchmarkId::new("png", overlay.to_string()), |b| {
            b.iter(|| renderer.render(black_box(&grid), black_box(&speeds), &region).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render_field, bench_full_render);
criterion_main!(benches);
