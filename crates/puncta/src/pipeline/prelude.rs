//! Shared imports for pipeline stage modules.

pub(crate) use crate::config::{QcConfig, WorkflowConfig};
pub(crate) use crate::error::{Result, SegmentationError};
pub(crate) use crate::morphology::{
    ball_offsets, binary_dilation, euclidean_distance_transform, label_components, label_sizes,
    remove_small_labels, watershed, WatershedOptions,
};
pub(crate) use crate::volume::{
    count_nonzero, count_true, Connectivity, Labels, Mask, Segmentation, Volume, FOREGROUND,
};
