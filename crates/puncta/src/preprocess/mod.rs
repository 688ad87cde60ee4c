//! Intensity preprocessing: normalization, optional XY rescale, smoothing.

pub mod normalize;
pub mod rescale;
pub mod smooth;

pub use normalize::{normalize_intensity, rescale_min_max};
pub use rescale::{rescale_xy, zoomed_shape};
pub use smooth::smooth_slice_by_slice;
