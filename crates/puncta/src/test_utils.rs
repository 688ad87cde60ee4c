//! Synthetic volumes shared by unit tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::volume::Volume;

/// Sum of isotropic Gaussian spots of height `amplitude` at `centres` (z, y, x).
pub(crate) fn gaussian_blob_volume(
    dim: (usize, usize, usize),
    centres: &[[f32; 3]],
    sigma: f32,
    amplitude: f32,
) -> Volume {
    let two_s2 = 2.0 * sigma * sigma;
    Volume::from_shape_fn(dim, |(z, y, x)| {
        centres
            .iter()
            .map(|c| {
                let dz = z as f32 - c[0];
                let dy = y as f32 - c[1];
                let dx = x as f32 - c[2];
                amplitude * (-(dz * dz + dy * dy + dx * dx) / two_s2).exp()
            })
            .sum()
    })
}

/// Add uniform noise in `[0, level)` with a fixed seed.
pub(crate) fn with_noise(mut volume: Volume, level: f32, seed: u64) -> Volume {
    let mut rng = StdRng::seed_from_u64(seed);
    volume.mapv_inplace(|v| v + rng.gen_range(0.0..level));
    volume
}
