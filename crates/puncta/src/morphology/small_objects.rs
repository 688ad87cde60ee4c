//! Size filtering of mask components and label regions.

use super::label::{label_components, label_sizes};
use crate::volume::{Connectivity, Labels, Mask};

/// Drop connected components of `mask` with fewer than `min_size` voxels.
pub fn remove_small_objects(mask: &Mask, min_size: usize, connectivity: Connectivity) -> Mask {
    if min_size <= 1 {
        return mask.clone();
    }
    let (labels, _) = label_components(mask, connectivity);
    let sizes = label_sizes(&labels);
    labels.mapv(|l| l != 0 && sizes[l as usize] >= min_size)
}

/// Zero every label whose voxel count is below `min_size`.
///
/// Regions are taken as given: a label split into several pieces is judged
/// by its total size.
pub fn remove_small_labels(labels: &Labels, min_size: usize) -> Labels {
    if min_size <= 1 {
        return labels.clone();
    }
    let sizes = label_sizes(labels);
    labels.mapv(|l| if l != 0 && sizes[l as usize] < min_size { 0 } else { l })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_below_threshold_are_removed() {
        let mut m = Mask::from_elem((2, 6, 6), false);
        m[[0, 0, 0]] = true;
        m[[0, 0, 1]] = true;
        for x in 2..6 {
            m[[1, 4, x]] = true;
        }
        let out = remove_small_objects(&m, 3, Connectivity::Face);
        assert!(!out[[0, 0, 0]] && !out[[0, 0, 1]]);
        assert!((2..6).all(|x| out[[1, 4, x]]));
        assert_eq!(remove_small_objects(&m, 1, Connectivity::Face), m);
    }

    #[test]
    fn connectivity_changes_what_counts_as_small() {
        let mut m = Mask::from_elem((3, 3, 3), false);
        m[[0, 0, 0]] = true;
        m[[1, 1, 1]] = true;
        m[[2, 2, 2]] = true;
        assert!(remove_small_objects(&m, 3, Connectivity::Face).iter().all(|&v| !v));
        assert_eq!(remove_small_objects(&m, 3, Connectivity::Full), m);
    }

    #[test]
    fn small_labels_are_zeroed_labelwise() {
        let mut l = Labels::zeros((1, 4, 4));
        l[[0, 0, 0]] = 1;
        l[[0, 3, 3]] = 1;
        l[[0, 1, 1]] = 2;
        l[[0, 2, 2]] = 3;
        let out = remove_small_labels(&l, 2);
        assert_eq!(out[[0, 0, 0]], 1);
        assert_eq!(out[[0, 3, 3]], 1);
        assert_eq!(out[[0, 1, 1]], 0);
        assert_eq!(out[[0, 2, 2]], 0);
    }
}
