//! Watershed seeds from region-restricted local maxima.
//!
//! The mask is split into regions and every region is searched on its own
//! bounding box: voxels of other regions are pushed to `f32::MIN`, a cubic
//! max filter finds the plateau tops, and a greedy spacing pass keeps the
//! brightest peaks at least `min_distance` apart.

use ndarray::{s, Array3, Axis, Zip};

use crate::config::PeakConfig;
use crate::error::{Result, SegmentationError};
use crate::morphology::{ball_offsets, binary_opening, bounding_boxes, label_components};
use crate::volume::{min_max, Labels, Mask, Volume};

/// A candidate maximum in volume coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub index: [usize; 3],
    pub value: f32,
}

/// Maximum over the `(2 * radius + 1)³` cube around each voxel.
///
/// The window is clipped at the volume border, which is the same as
/// extending the volume with its nearest voxel.
pub fn maximum_filter_cube(volume: &Volume, radius: usize) -> Volume {
    let mut out = volume.clone();
    if radius == 0 {
        return out;
    }
    let mut line = Vec::new();
    for axis in 0..3 {
        Zip::from(out.lanes_mut(Axis(axis))).for_each(|mut lane| {
            line.clear();
            line.extend(lane.iter().copied());
            let n = line.len();
            for (i, o) in lane.iter_mut().enumerate() {
                let lo = i.saturating_sub(radius);
                let hi = (i + radius).min(n - 1);
                *o = line[lo..=hi].iter().copied().fold(f32::MIN, f32::max);
            }
        });
    }
    out
}

/// Order peaks by descending value, keeping raster order among equal values.
fn sort_peaks(peaks: &mut [Peak]) {
    peaks.sort_by(|a, b| b.value.total_cmp(&a.value));
}

/// Greedy suppression: walk `peaks` in order and drop every peak closer than
/// `min_distance` (Chebyshev) to one already kept.
///
/// `origin` and `shape` describe the box the peaks live in.
fn ensure_spacing(
    peaks: &[Peak],
    min_distance: usize,
    origin: [usize; 3],
    shape: [usize; 3],
) -> Vec<Peak> {
    if min_distance <= 1 {
        // Distinct voxels are always at least one apart.
        return peaks.to_vec();
    }
    let reach = min_distance - 1;
    let mut taken = Array3::from_elem((shape[0], shape[1], shape[2]), false);
    let mut kept = Vec::new();
    for peak in peaks {
        let local = [
            peak.index[0] - origin[0],
            peak.index[1] - origin[1],
            peak.index[2] - origin[2],
        ];
        let lo = |a: usize| local[a].saturating_sub(reach);
        let hi = |a: usize| (local[a] + reach).min(shape[a] - 1);
        let crowded = taken
            .slice(s![lo(0)..=hi(0), lo(1)..=hi(1), lo(2)..=hi(2)])
            .iter()
            .any(|&t| t);
        if !crowded {
            taken[[local[0], local[1], local[2]]] = true;
            kept.push(*peak);
        }
    }
    kept
}

/// Zero label voxels within `width` of any face.
fn clear_border(labels: &mut Labels, width: usize) {
    if width == 0 {
        return;
    }
    for axis in 0..3 {
        let n = labels.len_of(Axis(axis));
        let w = width.min(n);
        for i in (0..w).chain(n - w..n) {
            labels.index_axis_mut(Axis(axis), i).fill(0);
        }
    }
}

/// Peaks of one region, searched inside its bounding box.
fn region_peaks(
    image: &Volume,
    labels: &Labels,
    label: u32,
    origin: [usize; 3],
    shape: [usize; 3],
    threshold: f32,
    config: &PeakConfig,
) -> Vec<Peak> {
    let [z0, y0, x0] = origin;
    let [z1, y1, x1] = [z0 + shape[0], y0 + shape[1], x0 + shape[2]];
    let region: Mask = labels.slice(s![z0..z1, y0..y1, x0..x1]).mapv(|l| l == label);
    let mut object = image.slice(s![z0..z1, y0..y1, x0..x1]).to_owned();
    Zip::from(&mut object)
        .and(&region)
        .for_each(|v, &inside| {
            if !inside {
                *v = f32::MIN;
            }
        });

    let local_max = maximum_filter_cube(&object, config.min_distance);
    let mut is_peak: Mask = Zip::from(&object).and(&local_max).map_collect(|&v, &m| v == m);
    let trivial = Zip::from(&is_peak)
        .and(&region)
        .fold(true, |acc, &p, &inside| acc && (p || !inside));
    if trivial {
        // Flat region: only voxels that an opening would erase count.
        let opened = binary_opening(&region, &ball_offsets(1));
        is_peak = Zip::from(&region).and(&opened).map_collect(|&r, &o| r ^ o);
    }

    let mut peaks: Vec<Peak> = Vec::new();
    for ((z, y, x), &p) in is_peak.indexed_iter() {
        let value = object[[z, y, x]];
        if p && value > threshold {
            peaks.push(Peak {
                index: [origin[0] + z, origin[1] + y, origin[2] + x],
                value,
            });
        }
    }
    sort_peaks(&mut peaks);
    let mut kept = ensure_spacing(&peaks, config.min_distance, origin, shape);
    if let Some(limit) = config.num_peaks_per_label {
        kept.truncate(limit);
    }
    kept
}

/// Local maxima of `image` restricted to the connected regions of `mask`.
pub fn find_peaks(image: &Volume, mask: &Mask, config: &PeakConfig) -> Result<Vec<Peak>> {
    if image.dim() != mask.dim() {
        return Err(SegmentationError::InvalidVolume(format!(
            "peak search: image {:?} and mask {:?} differ in shape",
            image.dim(),
            mask.dim()
        )));
    }
    if image.is_empty() {
        return Ok(Vec::new());
    }
    let (mut labels, n_labels) = label_components(mask, config.label_connectivity);
    if config.exclude_border {
        clear_border(&mut labels, config.min_distance);
    }

    let (vmin, vmax) = min_max(image);
    let mut threshold = config.threshold_abs.unwrap_or(vmin);
    if let Some(rel) = config.threshold_rel {
        threshold = threshold.max(rel * vmax);
    }

    let mut peaks = Vec::new();
    for (i, bbox) in bounding_boxes(&labels, n_labels).into_iter().enumerate() {
        let Some(bbox) = bbox else { continue };
        peaks.extend(region_peaks(
            image,
            &labels,
            i as u32 + 1,
            bbox.min,
            bbox.shape(),
            threshold,
            config,
        ));
    }

    sort_peaks(&mut peaks);
    if let Some(limit) = config.num_peaks.filter(|&n| peaks.len() > n) {
        let dim = image.dim();
        peaks = ensure_spacing(&peaks, config.min_distance, [0, 0, 0], [dim.0, dim.1, dim.2]);
        peaks.truncate(limit);
    }
    tracing::debug!("{} peaks in {n_labels} mask regions", peaks.len());
    Ok(peaks)
}

/// Boolean seed map with one `true` voxel per peak.
pub fn find_seeds(image: &Volume, mask: &Mask, config: &PeakConfig) -> Result<Mask> {
    let peaks = find_peaks(image, mask, config)?;
    let mut seeds = Mask::from_elem(image.dim(), false);
    for p in &peaks {
        seeds[p.index] = true;
    }
    Ok(seeds)
}
