use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use kuwahara_image::Image;
use kuwahara_imgproc::parallel::ExecutionStrategy;
use kuwahara_pipeline::{CpuBackend, FilterVariant, Pipeline, PipelineParams};

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline");

    for (width, height) in [(128, 96), (256, 224)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let image = Image::<u8, 3>::from_fn([*width, *height].into(), |r, c| {
            [(r % 256) as u8, (c % 256) as u8, ((r + c) % 256) as u8]
        })
        .unwrap();

        for variant in [FilterVariant::SectorFilter1, FilterVariant::SectorFilter4].iter() {
            let parameter_string = format!("{}x{}", width, height);
            let params = PipelineParams::default()
                .with_radius(6.0)
                .with_variant(*variant);

            let backend = CpuBackend::new(ExecutionStrategy::default()).unwrap();
            let mut pipeline = Pipeline::new(backend, params)
                .unwrap()
                .with_visualization(false);

            group.bench_with_input(
                BenchmarkId::new(variant.name(), &parameter_string),
                &image,
                |b, image| b.iter(|| black_box(pipeline.run(image))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
