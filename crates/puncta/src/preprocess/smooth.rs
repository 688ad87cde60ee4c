//! Slice-wise Gaussian smoothing.

use image::{ImageBuffer, Luma};
use ndarray::{Array2, Axis};

use crate::error::{Result, SegmentationError};
use crate::volume::Volume;

/// Kernel half-width used for a given sigma and truncation.
pub fn kernel_radius(sigma: f32, truncate: f32) -> usize {
    (truncate as f64 * sigma as f64 + 0.5) as usize
}

/// Normalized 1D Gaussian weights on `[-radius, radius]`.
pub(crate) fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f64> {
    let r = radius as isize;
    let mut kernel: Vec<f64> = (-r..=r)
        .map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= sum;
    }
    kernel
}

/// Gaussian-smooth every depth slice independently.
///
/// Each slice is filtered along height and width with the same normalized
/// kernel; edges continue with the nearest voxel.
pub fn smooth_slice_by_slice(volume: &Volume, sigma: f32, truncate: f32) -> Result<Volume> {
    let radius = kernel_radius(sigma, truncate);
    let kernel: Vec<f32> = gaussian_kernel(sigma as f64, radius)
        .into_iter()
        .map(|w| w as f32)
        .collect();
    let (_, h, w) = volume.dim();
    tracing::debug!("slice smoothing: sigma={sigma}, radius={radius}");

    let mut out = Volume::zeros(volume.dim());
    for (src, mut dst) in volume.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
        let slice: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_raw(w as u32, h as u32, src.iter().copied().collect()).ok_or_else(
                || SegmentationError::InvalidVolume(format!("slice of {w}x{h} does not fit an image")),
            )?;
        let blurred = imageproc::filter::separable_filter_equal(&slice, &kernel);
        let blurred = Array2::from_shape_vec((h, w), blurred.into_raw())?;
        dst.assign(&blurred);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_rounds_like_truncated_support() {
        assert_eq!(kernel_radius(1.0, 3.0), 3);
        assert_eq!(kernel_radius(1.0, 1.5), 2);
        assert_eq!(kernel_radius(0.5, 4.0), 2);
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(1.3, 4);
        assert_eq!(k.len(), 9);
        assert!((k.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for i in 0..4 {
            assert!((k[i] - k[8 - i]).abs() < 1e-15);
        }
        assert!(k[4] > k[3]);
    }

    #[test]
    fn constant_volume_is_unchanged() {
        let v = Volume::from_elem((2, 7, 9), 0.25);
        let out = smooth_slice_by_slice(&v, 1.0, 3.0).unwrap();
        assert!(out.iter().all(|&x| (x - 0.25).abs() < 1e-6));
    }

    #[test]
    fn slices_are_filtered_independently() {
        let mut v = Volume::zeros((3, 11, 11));
        v[[1, 5, 5]] = 1.0;
        let out = smooth_slice_by_slice(&v, 1.0, 3.0).unwrap();
        assert!(out.index_axis(Axis(0), 0).iter().all(|&x| x == 0.0));
        assert!(out.index_axis(Axis(0), 2).iter().all(|&x| x == 0.0));
        let plane = out.index_axis(Axis(0), 1);
        assert!((plane.sum() - 1.0).abs() < 1e-5);
        assert!((plane[[5, 4]] - plane[[4, 5]]).abs() < 1e-7);
        assert!(plane[[5, 5]] > plane[[5, 6]]);
    }
}
