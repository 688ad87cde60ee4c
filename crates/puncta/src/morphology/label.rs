//! Connected-component labeling of 3D masks.

use std::collections::VecDeque;

use crate::volume::{linear_index, offset_index, unravel_index, Connectivity, Labels, Mask};

/// Label connected `true` regions of `mask`.
///
/// Labels run from 1 to the returned count, numbered in raster order of each
/// component's first voxel. Background is 0.
pub fn label_components(mask: &Mask, connectivity: Connectivity) -> (Labels, usize) {
    let dim = mask.dim();
    let offsets = connectivity.offsets();
    let mut labels = Labels::zeros(dim);
    let mut next = 0u32;
    let mut queue = VecDeque::new();

    let (Some(m), Some(lab)) = (mask.as_slice(), labels.as_slice_mut()) else {
        // Non-contiguous input: label a standard-layout copy.
        return label_components(&mask.as_standard_layout().to_owned(), connectivity);
    };
    for start in 0..m.len() {
        if !m[start] || lab[start] != 0 {
            continue;
        }
        next += 1;
        lab[start] = next;
        queue.push_back(start);
        while let Some(i) = queue.pop_front() {
            let idx = unravel_index(i, dim);
            for &off in &offsets {
                if let Some(nb) = offset_index(idx, off, dim) {
                    let j = linear_index(nb, dim);
                    if m[j] && lab[j] == 0 {
                        lab[j] = next;
                        queue.push_back(j);
                    }
                }
            }
        }
    }
    (labels, next as usize)
}

/// Voxel count per label; index 0 holds the background count.
pub fn label_sizes(labels: &Labels) -> Vec<usize> {
    let max = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut sizes = vec![0usize; max + 1];
    for &l in labels.iter() {
        sizes[l as usize] += 1;
    }
    sizes
}

/// Inclusive bounding box of one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min: [usize; 3],
    pub max: [usize; 3],
}

impl BoundingBox {
    fn new(at: [usize; 3]) -> Self {
        Self { min: at, max: at }
    }

    fn include(&mut self, at: [usize; 3]) {
        for a in 0..3 {
            self.min[a] = self.min[a].min(at[a]);
            self.max[a] = self.max[a].max(at[a]);
        }
    }

    /// Extent along each axis.
    pub fn shape(&self) -> [usize; 3] {
        [
            self.max[0] - self.min[0] + 1,
            self.max[1] - self.min[1] + 1,
            self.max[2] - self.min[2] + 1,
        ]
    }
}

/// Bounding boxes indexed by `label - 1`; `None` for labels without voxels.
pub fn bounding_boxes(labels: &Labels, n_labels: usize) -> Vec<Option<BoundingBox>> {
    let mut boxes: Vec<Option<BoundingBox>> = vec![None; n_labels];
    for ((z, y, x), &l) in labels.indexed_iter() {
        if l == 0 || l as usize > n_labels {
            continue;
        }
        let at = [z, y, x];
        match &mut boxes[l as usize - 1] {
            Some(b) => b.include(at),
            slot @ None => *slot = Some(BoundingBox::new(at)),
        }
    }
    boxes
}
