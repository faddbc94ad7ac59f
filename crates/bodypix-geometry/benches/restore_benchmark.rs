// Restore benchmark - measure logits -> full-resolution probability maps
//
// Run with: cargo bench --bench restore_benchmark

use bodypix_geometry::{
    calc_padding_for_dims, remove_padding_and_resize_back, resize_with_pad,
    scale_and_crop_to_input_tensor_shape, to_input_resolution_height_and_width, to_mask_tensor,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array3;

const OUTPUT_STRIDE: u32 = 16;

/// Logits with a soft vertical edge, roughly what a person mask looks like
fn synthetic_logits(height: usize, width: usize) -> Array3<f32> {
    Array3::from_shape_fn((height, width, 1), |(_, x, _)| {
        (x as f32 - width as f32 / 2.0) / 4.0
    })
}

/// Benchmark the full restore path at different source resolutions
fn bench_scale_and_crop(c: &mut Criterion) {
    let mut group = c.benchmark_group("scale_and_crop");

    // Source sizes: VGA, HD, Full HD
    let resolutions = vec![
        ((480u32, 640u32), "640x480"),
        ((720, 1280), "1280x720"),
        ((1080, 1920), "1920x1080"),
    ];

    for ((height, width), name) in resolutions {
        let Ok((input_h, input_w)) =
            to_input_resolution_height_and_width(0.5, OUTPUT_STRIDE, height, width)
        else {
            continue;
        };
        let Ok(padding) =
            calc_padding_for_dims(height as usize, width as usize, input_h, input_w)
        else {
            continue;
        };

        // Model output grid for the stride-valid input
        let stride = OUTPUT_STRIDE as usize;
        let logits = synthetic_logits((input_h - 1) / stride + 1, (input_w - 1) / stride + 1);

        group.bench_with_input(BenchmarkId::new("sigmoid", name), &logits, |b, logits| {
            b.iter(|| {
                let result = scale_and_crop_to_input_tensor_shape(
                    black_box(logits),
                    input_h,
                    input_w,
                    padding.top,
                    padding.bottom,
                    padding.left,
                    padding.right,
                    true,
                );
                black_box(result)
            });
        });
    }

    group.finish();
}

/// Benchmark individual stages: letterbox resize vs padding removal vs threshold
fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("restore_stages");

    let logits = synthetic_logits(33, 41);
    let Ok(padded) = resize_with_pad(&logits, 513, 641) else {
        return;
    };

    group.bench_function("resize_with_pad_513x641", |b| {
        b.iter(|| black_box(resize_with_pad(black_box(&logits), 513, 641)));
    });

    group.bench_function("remove_padding_480x640", |b| {
        b.iter(|| {
            black_box(remove_padding_and_resize_back(
                black_box(&padded),
                480,
                640,
                16,
                17,
                0,
                1,
            ))
        });
    });

    group.bench_function("to_mask_tensor_513x641", |b| {
        b.iter(|| black_box(to_mask_tensor(black_box(&padded), 0.0)));
    });

    group.finish();
}

criterion_group!(benches, bench_scale_and_crop, bench_stages);
criterion_main!(benches);
