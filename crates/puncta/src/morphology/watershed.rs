//! Marker-controlled watershed by priority flooding.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Result, SegmentationError};
use crate::volume::{linear_index, offset_index, unravel_index, Connectivity, Labels, Mask, Volume};

/// Flooding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatershedOptions {
    /// Adjacency used for flooding and for the line test.
    pub connectivity: Connectivity,
    /// Leave a one-voxel line of zeros between touching basins.
    pub watershed_line: bool,
}

impl Default for WatershedOptions {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Face,
            watershed_line: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    value: f32,
    age: u64,
    index: usize,
    source: usize,
}

// Min-heap on (value, age): lower values flood first, ties in push order.
impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .value
            .total_cmp(&self.value)
            .then_with(|| other.age.cmp(&self.age))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

/// Flood `image` from the positive labels in `markers`, restricted to `mask`.
///
/// Marker voxels outside the mask are ignored. Voxels not reached from any
/// marker stay 0, and so do watershed-line voxels when enabled.
pub fn watershed(
    image: &Volume,
    markers: &Labels,
    mask: Option<&Mask>,
    options: WatershedOptions,
) -> Result<Labels> {
    let dim = image.dim();
    if markers.dim() != dim || mask.is_some_and(|m| m.dim() != dim) {
        return Err(SegmentationError::InvalidVolume(format!(
            "watershed inputs disagree in shape: image {dim:?}, markers {:?}, mask {:?}",
            markers.dim(),
            mask.map(|m| m.dim())
        )));
    }
    let values: Vec<f32> = image.iter().copied().collect();
    let inside: Vec<bool> = match mask {
        Some(m) => m.iter().copied().collect(),
        None => vec![true; values.len()],
    };
    let offsets = options.connectivity.offsets();
    let mut output: Vec<u32> = markers
        .iter()
        .zip(&inside)
        .map(|(&l, &m)| if m { l } else { 0 })
        .collect();
    let mut line = vec![false; values.len()];

    let mut heap = BinaryHeap::new();
    let mut age = 0u64;
    for (i, &l) in output.iter().enumerate() {
        if l != 0 {
            heap.push(QueueItem {
                value: values[i],
                age,
                index: i,
                source: i,
            });
            age += 1;
        }
    }
    let n_markers = heap.len();

    let mut neighbours = Vec::with_capacity(offsets.len());
    while let Some(item) = heap.pop() {
        let is_marker = item.index == item.source;
        if output[item.index] != 0 && !is_marker {
            continue;
        }
        if line[item.index] {
            continue;
        }

        neighbours.clear();
        let idx = unravel_index(item.index, dim);
        neighbours.extend(
            offsets
                .iter()
                .filter_map(|&off| offset_index(idx, off, dim))
                .map(|nb| linear_index(nb, dim))
                .filter(|&j| inside[j]),
        );

        let label = output[item.source];
        if options.watershed_line && !is_marker {
            let touches_other = neighbours
                .iter()
                .any(|&j| !line[j] && output[j] != 0 && output[j] != label);
            if touches_other {
                line[item.index] = true;
                continue;
            }
        }
        output[item.index] = label;

        for &j in &neighbours {
            if output[j] != 0 || line[j] {
                continue;
            }
            age += 1;
            heap.push(QueueItem {
                value: values[j],
                age,
                index: j,
                source: item.source,
            });
        }
    }

    tracing::debug!(
        "watershed: {n_markers} marker voxels, {} line voxels",
        line.iter().filter(|&&l| l).count()
    );
    Ok(Labels::from_shape_vec(dim, output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Connectivity;

    fn two_basins() -> (Volume, Labels) {
        // Two valleys along x separated by a ridge at x = 4.
        let image = Volume::from_shape_fn((1, 3, 9), |(_, _, x)| {
            let x = x as f32;
            (x - 2.0).abs().min((x - 6.0).abs())
        });
        let mut markers = Labels::zeros((1, 3, 9));
        markers[[0, 1, 2]] = 1;
        markers[[0, 1, 6]] = 2;
        (image, markers)
    }

    #[test]
    fn floods_each_basin_from_its_marker() {
        let (image, markers) = two_basins();
        let out = watershed(
            &image,
            &markers,
            None,
            WatershedOptions {
                watershed_line: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(out.iter().all(|&l| l != 0));
        assert_eq!(out[[0, 0, 0]], 1);
        assert_eq!(out[[0, 2, 8]], 2);
        assert_eq!(out[[0, 1, 3]], 1);
        assert_eq!(out[[0, 1, 5]], 2);
    }

    #[test]
    fn watershed_line_separates_basins() {
        let (image, markers) = two_basins();
        let out = watershed(&image, &markers, None, WatershedOptions::default()).unwrap();
        for ((_, y, x), &l) in out.indexed_iter() {
            if x + 1 < 9 {
                let r = out[[0, y, x + 1]];
                assert!(l == 0 || r == 0 || l == r, "touching labels at ({y}, {x})");
            }
        }
        assert!((0..3).all(|y| out[[0, y, 4]] == 0));
        assert_eq!(out[[0, 1, 2]], 1);
        assert_eq!(out[[0, 1, 6]], 2);
    }

    #[test]
    fn mask_limits_flooding_and_drops_outside_markers() {
        let (image, mut markers) = two_basins();
        markers[[0, 0, 8]] = 3;
        let mut mask = Mask::from_elem((1, 3, 9), true);
        for y in 0..3 {
            mask[[0, y, 8]] = false;
        }
        mask[[0, 1, 4]] = false;
        let out = watershed(&image, &markers, Some(&mask), WatershedOptions::default()).unwrap();
        assert!(out.iter().all(|&l| l != 3));
        assert!((0..3).all(|y| out[[0, y, 8]] == 0));
        assert_eq!(out[[0, 1, 4]], 0);
    }

    #[test]
    fn unreached_regions_stay_background() {
        let image = Volume::zeros((1, 1, 5));
        let mut markers = Labels::zeros((1, 1, 5));
        markers[[0, 0, 0]] = 1;
        let mut mask = Mask::from_elem((1, 1, 5), true);
        mask[[0, 0, 2]] = false;
        let out = watershed(&image, &markers, Some(&mask), WatershedOptions::default()).unwrap();
        assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let err = watershed(
            &Volume::zeros((1, 2, 2)),
            &Labels::zeros((1, 2, 3)),
            None,
            WatershedOptions {
                connectivity: Connectivity::Full,
                watershed_line: true,
            },
        );
        assert!(matches!(err, Err(SegmentationError::InvalidVolume(_))));
    }
}
