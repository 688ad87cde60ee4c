//! puncta: pure-Rust segmentation of punctate sub-cellular structures.
//!
//! Tuned for SLC25A17 (peroxisome) puncta in 3D fluorescence stacks. The
//! pipeline stages are:
//!
//! 1. **Preprocess** – mean/std intensity normalization, optional XY rescale,
//!    slice-wise Gaussian smoothing.
//! 2. **Detect** – 3D Laplacian-of-Gaussian blob mask and local-maximum seeds.
//! 3. **Separate** – seed dilation, marker labeling, Euclidean distance
//!    transform and marker-controlled watershed with separating lines.
//! 4. **Finalize** – small-instance removal, binarization to 0/255, a
//!    foreground-size quality check.
//! 5. **Output** – save to TIFF, return arrays (optionally with a contour),
//!    or hand every intermediate to a caller-supplied sink.
//!
//! # Public API
//! - [`Segmenter`] and [`run_pipeline`] as entry points
//! - [`WorkflowConfig`] and its parts for tuning
//! - [`OutputMode`], [`SegmentationOutput`] and the sink/writer traits
//!
//! The numeric primitives are public under [`preprocess`], [`detect`] and
//! [`morphology`] for callers assembling their own workflows.

mod api;
pub mod config;
pub mod detect;
pub mod error;
pub mod morphology;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod volume;

#[cfg(test)]
mod test_utils;

pub use api::{run_pipeline, Segmenter};
pub use config::{IntensityScaling, PeakConfig, QcConfig, StructureParams, WorkflowConfig};
pub use error::{Result, SegmentationError};
pub use output::{
    read_volume, segmentation_contour, write_float_volume, write_segmentation, DiagnosticArray,
    DiagnosticsBundle, DiagnosticsSink, OutputKind, OutputMode, SegmentationOutput,
    TiffDiagnosticsSink, TiffVolumeWriter, VolumeWriter,
};
pub use pipeline::{binarize, PipelineStages, RunSummary, StageStats, SUMMARY_SCHEMA_V1};
pub use volume::{Connectivity, Labels, Mask, Segmentation, Volume, FOREGROUND};
