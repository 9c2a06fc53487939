//! Diffing engine benchmark: Measure buffer diff performance.
//!
//! Target: < 500µs for 200×50 buffer

use cellframe::buffer::diff::{build_diff, render_diff};
use cellframe::{Attributes, Cell, CellBuffer, Color, OutputBuffer};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Create a buffer with varied content for benchmarking.
fn create_test_buffer(width: u16, height: u16, seed: u16) -> CellBuffer {
    let mut buffer = CellBuffer::new(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            let ch = char::from(b'A' + ((x + y + seed) % 26) as u8);
            let fg = Color::rgb(
                ((x * 3 + seed) % 256) as u8,
                ((y * 7 + seed) % 256) as u8,
                ((x + y + seed) % 256) as u8,
            );
            // Runs of eight cells share a color.
            let fg = if x % 8 == 0 { fg } else { buffer.get_cell(i32::from(x) - 1, i32::from(y)).fg() };
            let cell = Cell::with_all(ch, fg, Color::rgb(20, 20, 30), Attributes::empty());
            buffer.set(i32::from(x), i32::from(y), cell);
        }
    }
    buffer
}

fn diff_identical_buffers(c: &mut Criterion) {
    let buffer = create_test_buffer(200, 50, 0);
    let buffer_clone = buffer.clone();
    let mut output = OutputBuffer::with_capacity(4096);

    c.bench_function("diff_200x50_identical", |b| {
        b.iter(|| {
            output.clear();
            render_diff(black_box(&buffer), Some(black_box(&buffer_clone)), &mut output)
        })
    });
}

fn diff_single_cell_change(c: &mut Criterion) {
    let buffer_a = create_test_buffer(200, 50, 0);
    let mut buffer_b = buffer_a.clone();
    // Change a single cell in the middle
    buffer_b.set(100, 25, Cell::new('X').with_fg(Color::rgb(255, 0, 0)));
    let mut output = OutputBuffer::with_capacity(4096);

    c.bench_function("diff_200x50_single_change", |b| {
        b.iter(|| {
            output.clear();
            render_diff(black_box(&buffer_b), Some(black_box(&buffer_a)), &mut output)
        })
    });
}

fn diff_many_changes(c: &mut Criterion) {
    let buffer_a = create_test_buffer(200, 50, 0);
    let buffer_b = create_test_buffer(200, 50, 1);
    let mut output = OutputBuffer::with_capacity(65536);

    c.bench_function("diff_200x50_full_change", |b| {
        b.iter(|| {
            output.clear();
            render_diff(black_box(&buffer_b), Some(black_box(&buffer_a)), &mut output)
        })
    });
}

fn diff_line_change(c: &mut Criterion) {
    let buffer_a = create_test_buffer(200, 50, 0);
    let mut buffer_b = buffer_a.clone();
    // Change one full line
    for x in 0..200 {
        buffer_b.set(x, 25, Cell::new('*').with_fg(Color::rgb(255, 255, 0)));
    }
    let mut output = OutputBuffer::with_capacity(4096);

    c.bench_function("diff_200x50_line_change", |b| {
        b.iter(|| {
            output.clear();
            render_diff(black_box(&buffer_b), Some(black_box(&buffer_a)), &mut output)
        })
    });
}

fn full_render(c: &mut Criterion) {
    let buffer = create_test_buffer(200, 50, 0);

    c.bench_function("render_full_200x50", |b| {
        b.iter(|| build_diff(black_box(&buffer), None))
    });
}

fn diff_various_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_by_size");

    for (width, height) in [(80, 24), (120, 40), (200, 50), (300, 80)] {
        let buffer_a = create_test_buffer(width, height, 0);
        let buffer_b = create_test_buffer(width, height, 1);

        group.bench_with_input(
            BenchmarkId::new("full_change", format!("{width}x{height}")),
            &(buffer_a, buffer_b),
            |b, (a, bb)| {
                let mut output = OutputBuffer::with_capacity(65536);
                b.iter(|| {
                    output.clear();
                    render_diff(black_box(bb), Some(black_box(a)), &mut output)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    diff_identical_buffers,
    diff_single_cell_change,
    diff_many_changes,
    diff_line_change,
    full_render,
    diff_various_sizes,
);
criterion_main!(benches);
