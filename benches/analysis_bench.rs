//! Benchmarks for page analysis
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bookcheck::{analyze_page, MarginOptions, RenderedPage};
use image::{GrayImage, Luma};

/// A 6x9in page with a grey text block and a few stray marks in the margins
fn sample_page(dpi: u32) -> RenderedPage {
    let width = 6 * dpi;
    let height = 9 * dpi;
    let mut img = GrayImage::from_pixel(width, height, Luma([255]));

    let left = dpi * 3 / 4;
    let right = width - dpi * 5 / 8;
    let top = dpi * 7 / 10;
    let bottom = height - dpi * 8 / 10;

    // Text lines with paragraph breaks
    for y in (top..bottom).step_by(dpi as usize / 6) {
        if (y / dpi) % 3 == 2 {
            continue;
        }
        for line in y..(y + dpi / 12).min(bottom) {
            for x in left..right {
                img.put_pixel(x, line, Luma([40]));
            }
        }
    }

    for y in (height / 2)..(height / 2 + dpi / 4) {
        for x in 2..(left / 2) {
            img.put_pixel(x, y, Luma([0]));
        }
    }

    RenderedPage::new(img)
}

fn bench_analyze_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_page");

    for dpi in [72u32, 150, 300] {
        let page = sample_page(dpi);
        let margins_only = MarginOptions::builder().dpi(dpi).build();
        let with_gaps = MarginOptions::builder()
            .dpi(dpi)
            .check_whitespace(true)
            .gap_min_height_in(0.5)
            .build();

        group.bench_with_input(BenchmarkId::new("margins", dpi), &page, |b, page| {
            b.iter(|| black_box(analyze_page(page, 1, &margins_only)))
        });
        group.bench_with_input(BenchmarkId::new("margins_and_gaps", dpi), &page, |b, page| {
            b.iter(|| black_box(analyze_page(page, 1, &with_gaps)))
        });
    }

    group.finish();
}

fn bench_option_builder(c: &mut Criterion) {
    c.bench_function("MarginOptions::builder", |b| {
        b.iter(|| {
            black_box(
                MarginOptions::builder()
                    .page_size(6.0, 9.0)
                    .margins(0.75, 0.625, 0.7, 0.8)
                    .skip_pct(10.0, 10.0)
                    .dpi(150)
                    .build(),
            )
        })
    });
}

criterion_group!(benches, bench_analyze_page, bench_option_builder);
criterion_main!(benches);
