//! Benchmarks for full-board compositing.
//!
//! Run with: cargo bench -p lifeview-render --bench composite_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lifeview_core::{AliveCell, Cell, EntityMirror, Identity, OwnershipIndex, Player};
use lifeview_render::{CompositeRenderer, Palette, PixelBuffer, Scene, Viewport};
use std::hint::black_box;

/// Board with roughly `density` percent of cells alive, spread over 8 owners.
fn make_board(density: usize) -> (EntityMirror<AliveCell>, EntityMirror<Player>) {
    let mut players = EntityMirror::new();
    for id in 0..8u32 {
        let hex = format!("#{:02X}{:02X}{:02X}", id * 30, 255 - id * 20, 128);
        players.on_insert(Player::new(id, Identity::from_bytes([id as u8; 32]), hex));
    }
    let mut cells = EntityMirror::new();
    let vp = Viewport::default();
    for y in 0..vp.rows() as i32 {
        for x in 0..vp.cols() as i32 {
            let h = (x as usize * 7 + y as usize * 13) % 100;
            if h < density {
                cells.on_insert(AliveCell::new(x, y, (x + y) as u32 % 8));
            }
        }
    }
    (cells, players)
}

fn bench_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite/full_board");
    let vp = Viewport::default();
    group.throughput(Throughput::Elements(u64::from(vp.cols() * vp.rows())));

    for density in [0usize, 10, 50] {
        let (cells, players) = make_board(density);
        let mut index = OwnershipIndex::new();
        let ownership = index.resolve(&players, Some(&Identity::from_bytes([0; 32])));
        let snapshot = cells.snapshot();
        let pending: Vec<Cell> = (0..32).map(|i| Cell::new(i * 3, i * 2)).collect();

        for grid_lines in [false, true] {
            let palette = Palette {
                grid_lines,
                ..Palette::default()
            };
            let renderer = CompositeRenderer::new(palette);
            let scene = Scene {
                cells: &snapshot,
                pending: &pending,
                ownership: &ownership,
                viewport: vp,
            };
            let mut out = PixelBuffer::new(0, 0, palette.background);
            let label = format!("density{density}_grid{grid_lines}");
            group.bench_with_input(BenchmarkId::from_parameter(label), &scene, |b, scene| {
                b.iter(|| black_box(renderer.render_into(scene, &mut out)));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_composite);
criterion_main!(benches);
