use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use kuwahara_image::Image;
use kuwahara_imgproc::{
    filter::{gaussian_blur, kernels::KernelSet},
    kuwahara::{anisotropic_kuwahara, kuwahara, SectorFilterParams, SectorWeights},
    structure::{structure_tensor, tensor_field},
};

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("Kuwahara");

    let kernels = KernelSet::new(8, 32, 0.5).unwrap();

    for (width, height) in [(128, 96), (256, 224)].iter() {
        for radius in [3.0f32, 6.0, 10.0].iter() {
            group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

            let parameter_string = format!("{}x{}x{}", width, height, radius);

            // input image, a diagonal ramp so the tensor field is not degenerate
            let image_size = [*width, *height].into();
            let src = Image::<f32, 4>::from_fn(image_size, |r, c| {
                let v = ((r + c) % 64) as f32 / 63.0;
                [v, 0.5 * v, 1.0 - v, 1.0]
            })
            .unwrap();

            let mut sst = Image::<f32, 4>::from_size_val(image_size, 0.0).unwrap();
            let mut smoothed = sst.clone();
            let mut tfm = sst.clone();
            structure_tensor(&src, &mut sst).unwrap();
            gaussian_blur(&sst, &mut smoothed, 2.0).unwrap();
            tensor_field(&smoothed, &mut tfm).unwrap();

            let params = SectorFilterParams {
                radius: *radius,
                ..Default::default()
            };

            group.bench_with_input(
                BenchmarkId::new("anisotropic_single", &parameter_string),
                &(&src, &tfm),
                |b, i| {
                    let (src, tfm) = *i;
                    let mut dst = src.clone();
                    b.iter(|| {
                        black_box(anisotropic_kuwahara(
                            src,
                            tfm,
                            SectorWeights::Single(&kernels.kernels()[0]),
                            8,
                            &params,
                            &mut dst,
                        ))
                    })
                },
            );

            group.bench_with_input(
                BenchmarkId::new("anisotropic_packed", &parameter_string),
                &(&src, &tfm),
                |b, i| {
                    let (src, tfm) = *i;
                    let mut dst = src.clone();
                    b.iter(|| {
                        black_box(anisotropic_kuwahara(
                            src,
                            tfm,
                            SectorWeights::Packed {
                                kernels: kernels.packed(),
                                channels: kernels.packed_channels(),
                            },
                            8,
                            &params,
                            &mut dst,
                        ))
                    })
                },
            );

            group.bench_with_input(
                BenchmarkId::new("gaussian_blur", &parameter_string),
                &sst,
                |b, sst| {
                    let mut dst = sst.clone();
                    b.iter(|| black_box(gaussian_blur(sst, &mut dst, *radius * 0.5)))
                },
            );

            group.bench_with_input(
                BenchmarkId::new("classic", &parameter_string),
                &src,
                |b, src| {
                    let mut dst = src.clone();
                    b.iter(|| black_box(kuwahara(src, *radius as usize, &mut dst)))
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_filters);
criterion_main!(benches);
