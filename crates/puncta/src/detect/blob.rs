//! Scale-normalized Laplacian-of-Gaussian blob response.

use ndarray::{Axis, Zip};

use crate::error::Result;
use crate::morphology::remove_small_objects;
use crate::preprocess::smooth::gaussian_kernel;
use crate::volume::{count_true, validate_volume, Connectivity, Mask, Volume};

/// Kernel support in units of sigma for the LoG filter.
pub const LOG_TRUNCATE: f64 = 4.0;

/// Second-derivative-of-Gaussian weights on `[-radius, radius]`.
fn gaussian_second_derivative_kernel(sigma: f64, radius: usize) -> Vec<f64> {
    let phi = gaussian_kernel(sigma, radius);
    let r = radius as isize;
    let s2 = sigma * sigma;
    (-r..=r)
        .zip(phi)
        .map(|(x, p)| {
            let x = x as f64;
            p * (x * x / (s2 * s2) - 1.0 / s2)
        })
        .collect()
}

/// Whole-sample-inclusive reflection: `d c b a | a b c d | d c b a`.
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let r = i.rem_euclid(2 * n);
    (if r >= n { 2 * n - 1 - r } else { r }) as usize
}

/// Correlate every line of `volume` along `axis` with a symmetric `kernel`.
fn correlate_axis(volume: &Volume, axis: Axis, kernel: &[f64]) -> Volume {
    let radius = (kernel.len() / 2) as isize;
    let n = volume.len_of(axis);
    let mut out = Volume::zeros(volume.dim());
    let mut line = vec![0.0f64; n];
    Zip::from(out.lanes_mut(axis))
        .and(volume.lanes(axis))
        .for_each(|mut dst, src| {
            for (l, &v) in line.iter_mut().zip(src.iter()) {
                *l = v as f64;
            }
            for (i, o) in dst.iter_mut().enumerate() {
                let mut acc = 0.0f64;
                for (k, &w) in kernel.iter().enumerate() {
                    let j = i as isize + k as isize - radius;
                    acc += w * line[reflect(j, n)];
                }
                *o = acc as f32;
            }
        });
    out
}

/// `-sigma^2` times the Gaussian Laplacian of `volume`.
///
/// Positive at bright blobs whose radius is close to `sigma * sqrt(3)`.
pub fn log_response(volume: &Volume, sigma: f32) -> Volume {
    let sigma = sigma as f64;
    let radius = (LOG_TRUNCATE * sigma + 0.5) as usize;
    let smooth = gaussian_kernel(sigma, radius);
    let second = gaussian_second_derivative_kernel(sigma, radius);

    let mut laplace = Volume::zeros(volume.dim());
    for derivative_axis in 0..3 {
        let mut term = volume.clone();
        for axis in 0..3 {
            let kernel = if axis == derivative_axis { &second } else { &smooth };
            term = correlate_axis(&term, Axis(axis), kernel);
        }
        laplace += &term;
    }
    let scale = -(sigma * sigma) as f32;
    laplace.mapv_inplace(|v| v * scale);
    laplace
}

/// Blob response, threshold and 6-connected small-object removal.
pub fn detect_blobs(
    volume: &Volume,
    sigma: f32,
    cutoff: f32,
    min_area: usize,
) -> Result<(Volume, Mask)> {
    validate_volume(volume)?;
    let response = log_response(volume, sigma);
    let thresholded: Mask = response.mapv(|r| r > cutoff);
    let n_raw = count_true(&thresholded);
    let mask = remove_small_objects(&thresholded, min_area, Connectivity::Face);
    tracing::debug!(
        "blob mask: {} voxels above cutoff {cutoff}, {} after removing objects < {min_area}",
        n_raw,
        count_true(&mask)
    );
    Ok((response, mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::gaussian_blob_volume;

    #[test]
    fn second_derivative_kernel_has_zero_mean() {
        let k = gaussian_second_derivative_kernel(1.0, 4);
        assert_eq!(k.len(), 9);
        assert!(k.iter().sum::<f64>().abs() < 1e-3);
        assert!(k[4] < 0.0);
    }

    #[test]
    fn reflect_repeats_edge_sample() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn constant_volume_has_no_response() {
        let v = Volume::from_elem((6, 8, 8), 0.7);
        let r = log_response(&v, 1.0);
        assert!(r.iter().all(|x| x.abs() < 1e-3));
    }

    #[test]
    fn bright_blob_peaks_at_its_centre() {
        let v = gaussian_blob_volume((9, 21, 21), &[[4.0, 10.0, 10.0]], 1.5, 1.0);
        let r = log_response(&v, 1.0);
        let centre = r[[4, 10, 10]];
        assert!(centre > 0.1, "centre response {centre}");
        assert!(r.iter().all(|&x| x <= centre + 1e-6));
        assert!(r[[4, 10, 18]] < 0.01);
    }

    #[test]
    fn detect_blobs_drops_tiny_components() {
        let v = gaussian_blob_volume((9, 21, 21), &[[4.0, 10.0, 10.0]], 1.5, 1.0);
        let (_, mask) = detect_blobs(&v, 1.0, 0.045, 3).unwrap();
        assert!(mask[[4, 10, 10]]);
        assert!(!mask[[0, 0, 0]]);

        let (_, none) = detect_blobs(&v, 1.0, 10.0, 3).unwrap();
        assert_eq!(count_true(&none), 0);
    }
}
