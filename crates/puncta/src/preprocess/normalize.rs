//! Intensity normalization.

use crate::config::IntensityScaling;
use crate::volume::{min_max, Volume};

/// Guard added to numerator and denominator of every min–max rescale.
pub const NORMALIZATION_EPS: f64 = 1e-8;

/// Clip `volume` to the window implied by `scaling` and map it to `[0, 1]`.
///
/// A constant volume maps to a uniform finite value (1.0) instead of dividing
/// by zero.
pub fn normalize_intensity(volume: &Volume, scaling: &IntensityScaling) -> Volume {
    if volume.is_empty() {
        return volume.clone();
    }
    let (vmin, vmax) = min_max(volume);
    let (lo, hi) = match *scaling {
        IntensityScaling::MeanStd { lower, upper } => {
            let (m, s) = mean_std(volume.iter().copied());
            (
                (m - lower as f64 * s).max(vmin as f64),
                (m + upper as f64 * s).min(vmax as f64),
            )
        }
        IntensityScaling::MeanStdBounded {
            lower,
            upper,
            valid_min,
            valid_max,
        } => {
            let inside = volume
                .iter()
                .copied()
                .filter(|&v| v > valid_min && v < valid_max);
            let (m, s) = mean_std(inside);
            if m.is_nan() {
                // Nothing inside the validity range: fall back to the bounds.
                (valid_min as f64, valid_max as f64)
            } else {
                (
                    (m - lower as f64 * s).max(valid_min as f64),
                    (m + upper as f64 * s).min(valid_max as f64),
                )
            }
        }
        IntensityScaling::MinMax { upper_bound } => {
            if let Some(bound) = upper_bound {
                let replaced = volume.mapv(|v| if v > bound { vmin } else { v });
                let (lo, hi) = min_max(&replaced);
                return stretch(&replaced, lo as f64, hi as f64);
            }
            (vmin as f64, vmax as f64)
        }
    };
    tracing::debug!("intensity window [{lo:.4}, {hi:.4}] (data range [{vmin}, {vmax}])");
    stretch(volume, lo, hi)
}

/// Min–max rescale using the observed range of `volume`.
pub fn rescale_min_max(volume: &Volume) -> Volume {
    if volume.is_empty() {
        return volume.clone();
    }
    let (lo, hi) = min_max(volume);
    stretch(volume, lo as f64, hi as f64)
}

/// Clip to `[lo, hi]` and apply `(x - lo + eps) / (hi - lo + eps)`.
fn stretch(volume: &Volume, lo: f64, hi: f64) -> Volume {
    let denom = hi - lo + NORMALIZATION_EPS;
    volume.mapv(|v| {
        let clipped = (v as f64).clamp(lo.min(hi), hi.max(lo));
        ((clipped - lo + NORMALIZATION_EPS) / denom) as f32
    })
}

/// Maximum-likelihood normal fit (population standard deviation).
///
/// Returns `(NaN, NaN)` for an empty sequence.
fn mean_std(values: impl Iterator<Item = f32>) -> (f64, f64) {
    // Welford accumulation keeps large volumes numerically stable.
    let mut n = 0u64;
    let mut mean = 0.0f64;
    let mut m2 = 0.0f64;
    for v in values {
        n += 1;
        let x = v as f64;
        let delta = x - mean;
        mean += delta / n as f64;
        m2 += delta * (x - mean);
    }
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    (mean, (m2 / n as f64).sqrt())
}
