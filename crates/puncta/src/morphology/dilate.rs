//! Binary dilation, erosion and opening with offset-list footprints.

use crate::volume::{offset_index, Mask};

/// Offsets of a digital ball of `radius`: every `(dz, dy, dx)` with
/// `dz² + dy² + dx² <= radius²`, centre included.
pub fn ball_offsets(radius: usize) -> Vec<[isize; 3]> {
    let r = radius as isize;
    let mut out = Vec::new();
    for dz in -r..=r {
        for dy in -r..=r {
            for dx in -r..=r {
                if dz * dz + dy * dy + dx * dx <= r * r {
                    out.push([dz, dy, dx]);
                }
            }
        }
    }
    out
}

/// Set every voxel covered by `footprint` placed on a `true` voxel.
pub fn binary_dilation(mask: &Mask, footprint: &[[isize; 3]]) -> Mask {
    let dim = mask.dim();
    let mut out = Mask::from_elem(dim, false);
    for (idx, &v) in mask.indexed_iter() {
        if !v {
            continue;
        }
        for &off in footprint {
            if let Some(nb) = offset_index(idx, off, dim) {
                out[nb] = true;
            }
        }
    }
    out
}

/// Keep voxels whose whole footprint lies on `true` voxels.
///
/// Positions outside the volume count as background.
pub fn binary_erosion(mask: &Mask, footprint: &[[isize; 3]]) -> Mask {
    let dim = mask.dim();
    let mut out = Mask::from_elem(dim, false);
    for (idx, &v) in mask.indexed_iter() {
        if !v {
            continue;
        }
        out[idx] = footprint
            .iter()
            .all(|&off| offset_index(idx, off, dim).is_some_and(|nb| mask[nb]));
    }
    out
}

/// Erosion followed by dilation with the same footprint.
pub fn binary_opening(mask: &Mask, footprint: &[[isize; 3]]) -> Mask {
    binary_dilation(&binary_erosion(mask, footprint), footprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::count_true;

    #[test]
    fn ball_sizes() {
        assert_eq!(ball_offsets(0), vec![[0, 0, 0]]);
        assert_eq!(ball_offsets(1).len(), 7);
        assert_eq!(ball_offsets(2).len(), 33);
    }

    #[test]
    fn dilation_of_single_voxel_is_cross() {
        let mut m = Mask::from_elem((3, 3, 3), false);
        m[[1, 1, 1]] = true;
        let d = binary_dilation(&m, &ball_offsets(1));
        assert_eq!(count_true(&d), 7);
        assert!(d[[0, 1, 1]] && d[[1, 1, 2]]);
        assert!(!d[[0, 0, 0]]);
    }

    #[test]
    fn dilation_clips_at_volume_edges() {
        let mut m = Mask::from_elem((2, 2, 2), false);
        m[[0, 0, 0]] = true;
        assert_eq!(count_true(&binary_dilation(&m, &ball_offsets(1))), 4);
    }

    #[test]
    fn opening_removes_thin_protrusions() {
        let mut m = Mask::from_elem((5, 7, 7), false);
        for z in 1..4 {
            for y in 1..4 {
                for x in 1..4 {
                    m[[z, y, x]] = true;
                }
            }
        }
        m[[2, 2, 5]] = true;
        let cross = ball_offsets(1);
        let opened = binary_opening(&m, &cross);
        assert!(!opened[[2, 2, 5]]);
        assert!(opened[[2, 2, 2]]);
        assert!(binary_erosion(&m, &cross)[[2, 2, 2]]);
        assert_eq!(count_true(&binary_erosion(&m, &cross)), 1);
    }

    #[test]
    fn erosion_treats_outside_as_background() {
        let m = Mask::from_elem((3, 3, 3), true);
        let e = binary_erosion(&m, &ball_offsets(1));
        assert_eq!(count_true(&e), 1);
        assert!(e[[1, 1, 1]]);
    }
}
