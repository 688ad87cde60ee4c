use criterion::{black_box, criterion_group, criterion_main, Criterion};
use puncta::detect::{find_seeds, log_response};
use puncta::morphology::{
    ball_offsets, binary_dilation, euclidean_distance_transform, label_components, watershed,
    WatershedOptions,
};
use puncta::preprocess::{rescale_xy, smooth_slice_by_slice};
use puncta::{Connectivity, Mask, PeakConfig, Segmenter, Volume};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DIM: (usize, usize, usize) = (24, 128, 128);

/// Random Gaussian puncta over a noisy background.
fn make_puncta_volume(n_spots: usize, seed: u64) -> Volume {
    let mut rng = StdRng::seed_from_u64(seed);
    let centres: Vec<[f32; 3]> = (0..n_spots)
        .map(|_| {
            [
                rng.gen_range(3.0..(DIM.0 as f32 - 3.0)),
                rng.gen_range(3.0..(DIM.1 as f32 - 3.0)),
                rng.gen_range(3.0..(DIM.2 as f32 - 3.0)),
            ]
        })
        .collect();
    let mut volume = Volume::zeros(DIM);
    for c in &centres {
        let z0 = (c[0] as usize).saturating_sub(5);
        let y0 = (c[1] as usize).saturating_sub(5);
        let x0 = (c[2] as usize).saturating_sub(5);
        for z in z0..(z0 + 11).min(DIM.0) {
            for y in y0..(y0 + 11).min(DIM.1) {
                for x in x0..(x0 + 11).min(DIM.2) {
                    let d2 = (z as f32 - c[0]).powi(2)
                        + (y as f32 - c[1]).powi(2)
                        + (x as f32 - c[2]).powi(2);
                    volume[[z, y, x]] += 800.0 * (-d2 / 4.5).exp();
                }
            }
        }
    }
    volume.mapv_inplace(|v| v + rng.gen_range(90.0f32..110.0));
    volume
}

fn blob_mask(volume: &Volume) -> Mask {
    let max = volume.iter().copied().fold(f32::MIN, f32::max);
    volume.mapv(|v| v > 0.3 * max)
}

fn bench_preprocess(c: &mut Criterion) {
    let volume = make_puncta_volume(200, 1);
    c.bench_function("smooth_24x128x128", |b| {
        b.iter(|| {
            let out = smooth_slice_by_slice(black_box(&volume), 1.0, 3.0)
                .expect("valid smoothing parameters");
            black_box(out.len())
        })
    });
    c.bench_function("rescale_xy_half_24x128x128", |b| {
        b.iter(|| {
            let out = rescale_xy(black_box(&volume), 0.5).expect("positive ratio");
            black_box(out.dim())
        })
    });
}

fn bench_log(c: &mut Criterion) {
    let volume = make_puncta_volume(200, 2);
    c.bench_function("log_response_24x128x128", |b| {
        b.iter(|| black_box(log_response(black_box(&volume), 1.0)))
    });
}

fn bench_seeds(c: &mut Criterion) {
    let volume = make_puncta_volume(200, 3);
    let mask = blob_mask(&volume);
    let cfg = PeakConfig::default();
    c.bench_function("find_seeds_200_spots", |b| {
        b.iter(|| {
            let seeds = find_seeds(black_box(&volume), black_box(&mask), black_box(&cfg))
                .expect("matching shapes");
            black_box(seeds)
        })
    });
}

fn bench_separation(c: &mut Criterion) {
    let volume = make_puncta_volume(200, 4);
    let mask = blob_mask(&volume);
    c.bench_function("edt_24x128x128", |b| {
        b.iter(|| black_box(euclidean_distance_transform(black_box(&mask))))
    });

    let seeds = find_seeds(&volume, &mask, &PeakConfig::default()).expect("matching shapes");
    let (markers, _) = label_components(
        &binary_dilation(&seeds, &ball_offsets(1)),
        Connectivity::Face,
    );
    let elevation = euclidean_distance_transform(&mask).mapv(|d| -d);
    c.bench_function("watershed_24x128x128", |b| {
        b.iter(|| {
            let labels = watershed(
                black_box(&elevation),
                black_box(&markers),
                Some(&mask),
                WatershedOptions::default(),
            )
            .expect("matching shapes");
            black_box(labels)
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let volume = make_puncta_volume(200, 5);
    let segmenter = Segmenter::default();
    c.bench_function("pipeline_24x128x128", |b| {
        b.iter(|| {
            let stages = segmenter
                .segment_stages(black_box(&volume), None)
                .expect("finite synthetic volume");
            black_box(stages.stats.instances)
        })
    });
}

criterion_group!(
    hotpaths,
    bench_preprocess,
    bench_log,
    bench_seeds,
    bench_separation,
    bench_pipeline
);
criterion_main!(hotpaths);
