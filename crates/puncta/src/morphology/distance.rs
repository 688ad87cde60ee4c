//! Exact Euclidean distance transform.
//!
//! Separable lower-envelope-of-parabolas algorithm (Felzenszwalb and
//! Huttenlocher), run once per axis on squared distances.

use ndarray::{Array3, Axis, Zip};

use crate::volume::{Mask, Volume};

/// Squared-distance seed for voxels that have no background voxel in reach.
const FAR: f64 = 1e20;

/// Distance from every `true` voxel to the nearest `false` voxel.
///
/// Background voxels get 0. A mask without background yields very large
/// (but finite) values.
pub fn euclidean_distance_transform(mask: &Mask) -> Volume {
    let mut sq: Array3<f64> = mask.mapv(|v| if v { FAR } else { 0.0 });
    for axis in (0..3).rev() {
        transform_axis(&mut sq, Axis(axis));
    }
    sq.mapv(|d| d.sqrt() as f32)
}

fn transform_axis(sq: &mut Array3<f64>, axis: Axis) {
    let n = sq.len_of(axis);
    let mut f = vec![0.0f64; n];
    let mut buf = LowerEnvelope::with_len(n);
    Zip::from(sq.lanes_mut(axis)).for_each(|mut lane| {
        for (dst, &v) in f.iter_mut().zip(lane.iter()) {
            *dst = v;
        }
        buf.transform(&f);
        for (dst, &v) in lane.iter_mut().zip(buf.d.iter()) {
            *dst = v;
        }
    });
}

struct LowerEnvelope {
    v: Vec<usize>,
    z: Vec<f64>,
    d: Vec<f64>,
}

impl LowerEnvelope {
    fn with_len(n: usize) -> Self {
        Self {
            v: vec![0; n],
            z: vec![0.0; n + 1],
            d: vec![0.0; n],
        }
    }

    fn transform(&mut self, f: &[f64]) {
        let n = f.len();
        if n == 0 {
            return;
        }
        let intersect = |q: usize, p: usize| -> f64 {
            let (qf, pf) = (q as f64, p as f64);
            ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
        };
        let mut k = 0usize;
        self.v[0] = 0;
        self.z[0] = f64::NEG_INFINITY;
        self.z[1] = f64::INFINITY;
        for q in 1..n {
            let mut s = intersect(q, self.v[k]);
            while s <= self.z[k] {
                k -= 1;
                s = intersect(q, self.v[k]);
            }
            k += 1;
            self.v[k] = q;
            self.z[k] = s;
            self.z[k + 1] = f64::INFINITY;
        }
        k = 0;
        for q in 0..n {
            while self.z[k + 1] < q as f64 {
                k += 1;
            }
            let p = self.v[k];
            let dq = q as f64 - p as f64;
            self.d[q] = dq * dq + f[p];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(mask: &Mask) -> Volume {
        let background: Vec<(usize, usize, usize)> = mask
            .indexed_iter()
            .filter(|(_, v)| !**v)
            .map(|(i, _)| i)
            .collect();
        Array3::from_shape_fn(mask.dim(), |(z, y, x)| {
            if !mask[[z, y, x]] {
                return 0.0;
            }
            background
                .iter()
                .map(|&(bz, by, bx)| {
                    let dz = z as f32 - bz as f32;
                    let dy = y as f32 - by as f32;
                    let dx = x as f32 - bx as f32;
                    (dz * dz + dy * dy + dx * dx).sqrt()
                })
                .fold(f32::INFINITY, f32::min)
        })
    }

    #[test]
    fn matches_brute_force_on_random_masks() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5 {
            let mut mask = Mask::from_shape_fn((5, 7, 6), |_| rng.gen_bool(0.8));
            mask[[0, 0, 0]] = false;
            let fast = euclidean_distance_transform(&mask);
            let slow = brute_force(&mask);
            for (a, b) in fast.iter().zip(slow.iter()) {
                assert!((a - b).abs() < 1e-4, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn single_background_voxel_gives_radial_distance() {
        let mut mask = Mask::from_elem((3, 4, 5), true);
        mask[[0, 0, 0]] = false;
        let d = euclidean_distance_transform(&mask);
        assert_eq!(d[[0, 0, 0]], 0.0);
        assert!((d[[2, 3, 4]] - 29.0f32.sqrt()).abs() < 1e-5);
        assert!((d[[0, 0, 3]] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn all_background_is_zero() {
        let d = euclidean_distance_transform(&Mask::from_elem((2, 3, 3), false));
        assert!(d.iter().all(|&v| v == 0.0));
    }
}
