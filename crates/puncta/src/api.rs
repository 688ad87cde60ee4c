//! High-level segmentation API.
//!
//! [`Segmenter`] is the primary entry point. It wraps a [`WorkflowConfig`]
//! and the writer used by save mode; [`run_pipeline`] is the string-tagged
//! convenience form with the SLC25A17 preset.

use std::path::Path;

use crate::config::WorkflowConfig;
use crate::error::Result;
use crate::output::{
    DiagnosticsSink, OutputKind, OutputMode, SegmentationOutput, TiffVolumeWriter, VolumeWriter,
};
use crate::pipeline::{self, PipelineStages};
use crate::volume::Volume;

/// Primary segmentation interface.
///
/// Create once, segment many volumes.
///
/// # Examples
///
/// ```no_run
/// use puncta::{OutputMode, Segmenter, WorkflowConfig};
/// use std::path::Path;
///
/// let volume = puncta::read_volume(Path::new("cell.tiff")).unwrap();
/// let segmenter = Segmenter::new(WorkflowConfig::default());
/// let out = segmenter
///     .segment(&volume, None, OutputMode::Save {
///         output_dir: Path::new("out"),
///         base_name: "cell",
///     })
///     .unwrap();
/// println!("{out:?}");
/// ```
pub struct Segmenter {
    config: WorkflowConfig,
    writer: Box<dyn VolumeWriter>,
}

impl Segmenter {
    /// Segmenter writing multi-page TIFF files in save mode.
    pub fn new(config: WorkflowConfig) -> Self {
        Self::with_writer(config, Box::new(TiffVolumeWriter))
    }

    /// Segmenter with a custom destination for save mode.
    pub fn with_writer(config: WorkflowConfig, writer: Box<dyn VolumeWriter>) -> Self {
        Self { config, writer }
    }

    /// Load a JSON workflow configuration and create a segmenter in one step.
    pub fn from_config_json_file(path: &Path) -> Result<Self> {
        Ok(Self::new(WorkflowConfig::from_json_file(path)?))
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut WorkflowConfig {
        &mut self.config
    }

    /// Segment `volume` and hand the result to `mode`.
    ///
    /// `rescale_ratio` resamples height and width before smoothing; `None` or
    /// a non-positive ratio keeps the input resolution. Nothing is written
    /// unless every stage succeeds.
    pub fn segment(
        &self,
        volume: &Volume,
        rescale_ratio: Option<f32>,
        mode: OutputMode<'_>,
    ) -> Result<SegmentationOutput> {
        let stages = self.segment_stages(volume, rescale_ratio)?;
        self.emit(stages, mode)
    }

    /// Hand the result of [`Segmenter::segment_stages`] to `mode`.
    pub fn emit(&self, stages: PipelineStages, mode: OutputMode<'_>) -> Result<SegmentationOutput> {
        pipeline::dispatch(stages, mode, &self.config, self.writer.as_ref())
    }

    /// Run all stages and return every intermediate, including the instance
    /// labels the output modes flatten away.
    pub fn segment_stages(
        &self,
        volume: &Volume,
        rescale_ratio: Option<f32>,
    ) -> Result<PipelineStages> {
        pipeline::run_stages(volume, rescale_ratio, &self.config)
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(WorkflowConfig::default())
    }
}

/// Segment `volume` with the SLC25A17 preset, selecting the output by tag.
///
/// `output_mode` is one of `"default"`, `"array"`, `"array_with_contour"` or
/// `"customize"`. The tag and the parameters it requires are checked before
/// any computation starts.
pub fn run_pipeline<'a>(
    volume: &Volume,
    rescale_ratio: Option<f32>,
    output_mode: &str,
    output_path: Option<&'a Path>,
    base_name: Option<&'a str>,
    output_callback: Option<&'a mut dyn DiagnosticsSink>,
) -> Result<SegmentationOutput> {
    let kind: OutputKind = output_mode.parse()?;
    let mode = OutputMode::from_parts(kind, output_path, base_name, output_callback)?;
    Segmenter::default().segment(volume, rescale_ratio, mode)
}
