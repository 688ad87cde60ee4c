//! Post-processing: label filtering, binarization and the QC check.

use super::*;

pub(super) struct Finalized {
    pub instances: Labels,
    pub segmentation: Segmentation,
    pub n_instances: usize,
    pub qc_passed: bool,
}

/// Map non-zero labels to 255.
pub fn binarize(labels: &Labels) -> Segmentation {
    labels.mapv(|l| if l != 0 { FOREGROUND } else { 0 })
}

/// Warn when the mask is suspiciously small. Returns whether the check passed.
pub(super) fn quality_check(foreground: usize, qc: &QcConfig) -> bool {
    if foreground < qc.min_foreground_voxels {
        tracing::warn!(
            foreground,
            threshold = qc.min_foreground_voxels,
            "segmented foreground is small; please check the metadata of the source image"
        );
        return false;
    }
    true
}

pub(super) fn run(instances: &Labels, config: &WorkflowConfig) -> Finalized {
    let kept = remove_small_labels(instances, config.structure.min_area);
    let n_instances = label_sizes(&kept)
        .iter()
        .skip(1)
        .filter(|&&n| n > 0)
        .count();
    let segmentation = binarize(&kept);
    let foreground = count_nonzero(&segmentation);
    let qc_passed = quality_check(foreground, &config.qc);
    tracing::info!("{n_instances} instances, {foreground} foreground voxels");
    Finalized {
        instances: kept,
        segmentation,
        n_instances,
        qc_passed,
    }
}
