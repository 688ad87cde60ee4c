//! Volume containers and voxel-neighbourhood helpers.
//!
//! All arrays are `(depth, height, width)` in standard (row-major) layout.

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentationError};

/// Real-valued intensity volume.
pub type Volume = Array3<f32>;
/// Boolean voxel mask (preliminary mask, seed map).
pub type Mask = Array3<bool>;
/// Integer label volume; 0 is background.
pub type Labels = Array3<u32>;
/// Single-byte volume holding 0/255 values.
pub type Segmentation = Array3<u8>;

/// Foreground value of binarized outputs.
pub const FOREGROUND: u8 = 255;

/// Voxel adjacency rule used for grouping and flooding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Face neighbours only (6 in 3D).
    #[default]
    Face,
    /// Faces, edges and corners (26 in 3D).
    Full,
}

const FACE_OFFSETS: [[isize; 3]; 6] = [
    [-1, 0, 0],
    [0, -1, 0],
    [0, 0, -1],
    [0, 0, 1],
    [0, 1, 0],
    [1, 0, 0],
];

impl Connectivity {
    /// Neighbour offsets `(dz, dy, dx)` excluding the centre voxel, in raster order.
    pub fn offsets(self) -> Vec<[isize; 3]> {
        match self {
            Self::Face => FACE_OFFSETS.to_vec(),
            Self::Full => {
                let mut out = Vec::with_capacity(26);
                for dz in -1..=1 {
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            if dz != 0 || dy != 0 || dx != 0 {
                                out.push([dz, dy, dx]);
                            }
                        }
                    }
                }
                out
            }
        }
    }
}

/// Shift `idx` by `off` and return it when it stays inside `dim`.
#[inline]
pub(crate) fn offset_index(
    idx: (usize, usize, usize),
    off: [isize; 3],
    dim: (usize, usize, usize),
) -> Option<(usize, usize, usize)> {
    let z = idx.0.checked_add_signed(off[0])?;
    let y = idx.1.checked_add_signed(off[1])?;
    let x = idx.2.checked_add_signed(off[2])?;
    (z < dim.0 && y < dim.1 && x < dim.2).then_some((z, y, x))
}

/// Linear index of `(z, y, x)` in a standard-layout array of shape `dim`.
#[inline]
pub(crate) fn linear_index(idx: (usize, usize, usize), dim: (usize, usize, usize)) -> usize {
    (idx.0 * dim.1 + idx.1) * dim.2 + idx.2
}

/// Inverse of [`linear_index`].
#[inline]
pub(crate) fn unravel_index(i: usize, dim: (usize, usize, usize)) -> (usize, usize, usize) {
    let plane = dim.1 * dim.2;
    (i / plane, (i % plane) / dim.2, i % dim.2)
}

/// Reject volumes the primitives cannot process: empty axes or non-finite voxels.
pub fn validate_volume(volume: &Volume) -> Result<()> {
    let (d, h, w) = volume.dim();
    if d == 0 || h == 0 || w == 0 {
        return Err(SegmentationError::InvalidVolume(format!(
            "volume has an empty axis: shape ({d}, {h}, {w})"
        )));
    }
    if let Some(pos) = volume.iter().position(|v| !v.is_finite()) {
        let (z, y, x) = unravel_index(pos, (d, h, w));
        return Err(SegmentationError::InvalidVolume(format!(
            "non-finite intensity at ({z}, {y}, {x})"
        )));
    }
    Ok(())
}

/// Number of `true` voxels.
pub fn count_true(mask: &Mask) -> usize {
    mask.iter().filter(|&&v| v).count()
}

/// Number of non-zero voxels.
pub fn count_nonzero<T: Copy + Default + PartialEq>(volume: &Array3<T>) -> usize {
    let zero = T::default();
    volume.iter().filter(|&&v| v != zero).count()
}

/// Minimum and maximum of a non-empty volume.
pub fn min_max(volume: &Volume) -> (f32, f32) {
    volume
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
