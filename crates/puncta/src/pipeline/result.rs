use serde::{Deserialize, Serialize};

use crate::config::WorkflowConfig;
use crate::volume::{Labels, Mask, Segmentation, Volume};

pub const SUMMARY_SCHEMA_V1: &str = "puncta.summary.v1";

/// Voxel and object counts collected along one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStats {
    /// Working shape `(depth, height, width)` after optional rescale.
    pub shape: [usize; 3],
    /// Voxels of the blob mask after small-object removal.
    pub mask_voxels: usize,
    pub seeds: usize,
    /// Labelled marker blobs fed to the watershed.
    pub markers: usize,
    /// Distinct labels left after post-filtering.
    pub instances: usize,
    /// Mask voxels the watershed left at 0 (lines and unreached voxels).
    pub unassigned_mask_voxels: usize,
    pub foreground_voxels: usize,
    /// False when the foreground is below the QC threshold.
    pub qc_passed: bool,
}

/// Every intermediate of one run.
#[derive(Debug, Clone)]
pub struct PipelineStages {
    pub normalized: Volume,
    pub smoothed: Volume,
    pub log_response: Volume,
    pub preliminary_mask: Mask,
    pub seeds: Mask,
    pub markers: Labels,
    pub distance: Volume,
    /// Watershed labels after small-label removal; 0 is background or line.
    pub instances: Labels,
    pub segmentation: Segmentation,
    pub stats: StageStats,
}

/// Serializable description of a run, written by the CLI on request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub input_shape: [usize; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescale_ratio: Option<f32>,
    pub config: WorkflowConfig,
    pub stats: StageStats,
}

impl RunSummary {
    pub fn new(
        input: Option<String>,
        input_shape: (usize, usize, usize),
        rescale_ratio: Option<f32>,
        config: &WorkflowConfig,
        stats: &StageStats,
    ) -> Self {
        Self {
            schema_version: SUMMARY_SCHEMA_V1.to_string(),
            input,
            input_shape: [input_shape.0, input_shape.1, input_shape.2],
            rescale_ratio,
            config: config.clone(),
            stats: stats.clone(),
        }
    }
}
