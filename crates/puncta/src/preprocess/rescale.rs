//! In-plane resampling with quadratic B-spline interpolation.
//!
//! Height and width are resampled independently; the depth axis is left as is.
//! Output lengths follow `round_half_even(n * ratio)` and output sample `o`
//! maps to input coordinate `o * (n_in - 1) / (n_out - 1)`, so the first and
//! last samples of every line are preserved.

use ndarray::{Array3, ArrayView1, ArrayViewMut1, Axis, Zip};

use crate::error::{Result, SegmentationError};
use crate::volume::Volume;

/// Pole of the quadratic B-spline prefilter, `sqrt(8) - 3`.
const POLE: f64 = -0.171_572_875_253_809_9;
/// Gain `(1 - z)(1 - 1/z)` of the quadratic prefilter.
const GAIN: f64 = 8.0;

/// Shape of `dim` after in-plane rescaling by `ratio`.
pub fn zoomed_shape(dim: (usize, usize, usize), ratio: f32) -> (usize, usize, usize) {
    let scale = |n: usize| (n as f64 * ratio as f64).round_ties_even() as usize;
    (dim.0, scale(dim.1), scale(dim.2))
}

/// Resample height and width of `volume` by `ratio`.
pub fn rescale_xy(volume: &Volume, ratio: f32) -> Result<Volume> {
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(SegmentationError::InvalidConfig(format!(
            "rescale ratio must be positive and finite, got {ratio}"
        )));
    }
    let (d, h, w) = zoomed_shape(volume.dim(), ratio);
    if h == 0 || w == 0 {
        return Err(SegmentationError::InvalidVolume(format!(
            "rescale ratio {ratio} collapses {:?} to ({d}, {h}, {w})",
            volume.dim()
        )));
    }
    let rows = resample_axis(volume, Axis(1), h);
    let out = resample_axis(&rows, Axis(2), w);
    tracing::debug!("rescaled {:?} -> {:?}", volume.dim(), out.dim());
    Ok(out)
}

fn resample_axis(volume: &Volume, axis: Axis, n_out: usize) -> Volume {
    let mut shape = [volume.dim().0, volume.dim().1, volume.dim().2];
    let n_in = shape[axis.index()];
    shape[axis.index()] = n_out;
    let mut out = Array3::<f32>::zeros(shape);
    let step = if n_out > 1 {
        (n_in as f64 - 1.0) / (n_out as f64 - 1.0)
    } else {
        1.0
    };
    let mut coeffs = vec![0.0f64; n_in];
    Zip::from(out.lanes_mut(axis))
        .and(volume.lanes(axis))
        .for_each(|dst, src| {
            spline_coefficients(src, &mut coeffs);
            interpolate_line(&coeffs, step, dst);
        });
    out
}

/// Quadratic B-spline coefficients of `line` under mirror extension.
fn spline_coefficients(line: ArrayView1<'_, f32>, c: &mut [f64]) {
    let n = c.len();
    for (dst, &v) in c.iter_mut().zip(line.iter()) {
        *dst = v as f64;
    }
    if n == 1 {
        return;
    }
    for v in c.iter_mut() {
        *v *= GAIN;
    }

    // Causal initialisation, exact for the mirror-symmetric extension.
    let z = POLE;
    let z2n = z.powi(2 * n as i32 - 2);
    let mut zk = z;
    let mut acc = c[0] + z.powi(n as i32 - 1) * c[n - 1];
    for k in 1..n - 1 {
        acc += (zk + z2n / zk) * c[k];
        zk *= z;
    }
    c[0] = acc / (1.0 - z2n);
    for k in 1..n {
        c[k] += z * c[k - 1];
    }

    // Anti-causal pass.
    c[n - 1] = (z / (z * z - 1.0)) * (c[n - 1] + z * c[n - 2]);
    for k in (0..n - 1).rev() {
        c[k] = z * (c[k + 1] - c[k]);
    }
}

fn interpolate_line(c: &[f64], step: f64, mut dst: ArrayViewMut1<'_, f32>) {
    let n = c.len();
    for (o, out) in dst.iter_mut().enumerate() {
        let x = o as f64 * step;
        let m = x.round();
        let t = x - m;
        let m = m as isize;
        let w_lo = 0.5 * (0.5 - t) * (0.5 - t);
        let w_mid = 0.75 - t * t;
        let w_hi = 0.5 * (0.5 + t) * (0.5 + t);
        let v = w_lo * c[mirror(m - 1, n)] + w_mid * c[mirror(m, n)] + w_hi * c[mirror(m + 1, n)];
        *out = v as f32;
    }
}

/// Fold `i` into `[0, n)` by whole-sample mirroring (`-1 -> 1`, `n -> n - 2`).
fn mirror(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let r = i.rem_euclid(period);
    if r >= n as isize {
        (period - r) as usize
    } else {
        r as usize
    }
}
