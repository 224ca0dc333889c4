use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use zedbar_image::{FourCC, Image};

const SIZES: &[(u32, u32)] = &[(320, 240), (640, 480), (1920, 1080)];

fn gray(width: u32, height: u32) -> Vec<u8> {
    (0..width * height).map(|i| (i % 251) as u8).collect()
}

fn benchmark_set_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer");

    for &(width, height) in SIZES {
        let data = gray(width, height);
        let id = format!("{width}x{height}");

        group.bench_with_input(BenchmarkId::new("set_data", &id), &data, |b, data| {
            let mut image = Image::new().expect("Failed to create image");
            b.iter(|| image.set_data(black_box(data)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("data", &id), &data, |b, data| {
            let mut image = Image::new().expect("Failed to create image");
            image.set_data(data).unwrap();
            b.iter(|| black_box(image.data().unwrap()));
        });
    }

    group.finish();
}

fn benchmark_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    for &(width, height) in SIZES {
        let image = Image::from_gray(&gray(width, height), width, height)
            .expect("Failed to create image");
        let id = format!("{width}x{height}");

        for target in [FourCC::I420, FourCC::YUYV, FourCC::RGB3] {
            group.bench_function(BenchmarkId::new(target.to_string(), &id), |b| {
                b.iter(|| black_box(image.convert(target).unwrap()));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_set_get, benchmark_convert);
criterion_main!(benches);
