use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use ircut_calib::undistort::{undistort_image, Undistorter};
use ircut_calib::{CameraMatrix, CameraModel, DistortionCoeffs};
use ircut_image::{Image, ImageSize};

fn bench_model() -> CameraModel {
    CameraModel::new(
        CameraMatrix {
            fx: 800.0,
            fy: 800.0,
            cx: 320.0,
            cy: 240.0,
        },
        DistortionCoeffs {
            k1: -0.2,
            k2: 0.05,
            p1: 0.001,
            p2: -0.001,
            ..Default::default()
        },
    )
}

fn bench_undistort(c: &mut Criterion) {
    let model = bench_model();
    let size = ImageSize {
        width: 640,
        height: 480,
    };

    let mut data = Vec::with_capacity(size.width * size.height * 3);
    for i in 0..size.width * size.height * 3 {
        data.push((i % 251) as u8);
    }
    let src = Image::<u8, 3>::new(size, data).unwrap();
    let mut dst = Image::<u8, 3>::from_size_val(size, 0).unwrap();

    // map recomputed on every frame
    c.bench_function("undistort_full", |b| {
        b.iter(|| {
            undistort_image(black_box(&src), &mut dst, &model, None).unwrap();
        })
    });

    // map computed once per frame size
    let mut undistorter = Undistorter::new(model, Some(0.0));
    c.bench_function("undistort_cached", |b| {
        b.iter(|| {
            undistorter.correct(black_box(&src), &mut dst).unwrap();
        })
    });
}

criterion_group!(benches, bench_undistort);
criterion_main!(benches);
