//! Inner boundary of a segmentation.

use ndarray::Zip;

use crate::morphology::ball_offsets;
use crate::volume::{offset_index, Segmentation, FOREGROUND};

/// Foreground voxels removed by a `ball(1)` erosion of the mask.
///
/// A voxel is on the contour when one of its 6 face neighbours inside the
/// volume is background; positions outside the volume count as foreground.
pub fn segmentation_contour(segmentation: &Segmentation) -> Segmentation {
    let dim = segmentation.dim();
    let footprint = ball_offsets(1);
    let mut out = Segmentation::zeros(dim);
    Zip::indexed(&mut out).for_each(|idx, o| {
        if segmentation[idx] == 0 {
            return;
        }
        let on_boundary = footprint
            .iter()
            .filter_map(|&off| offset_index(idx, off, dim))
            .any(|nb| segmentation[nb] == 0);
        if on_boundary {
            *o = FOREGROUND;
        }
    });
    out
}
