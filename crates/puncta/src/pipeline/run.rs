//! Top-level orchestrator: preprocess → detect → separate → finalize → dispatch.

use super::*;
use crate::detect::{detect_blobs, find_seeds};
use crate::output::diagnostics::{
    DiagnosticArray, DiagnosticsBundle, BW_FINAL, IM_NORM, IM_SMOOTH, INTERM_LOCAL_MAX, INTERM_MASK,
};
use crate::output::{segmentation_contour, OutputMode, SegmentationOutput, VolumeWriter};
use crate::preprocess::{normalize_intensity, rescale_min_max, rescale_xy, smooth_slice_by_slice};
use crate::volume::validate_volume;

/// Ratio actually applied: `None` for absent or non-positive ratios.
pub(crate) fn effective_rescale_ratio(ratio: Option<f32>) -> Result<Option<f32>> {
    match ratio {
        Some(r) if !r.is_finite() => Err(SegmentationError::InvalidConfig(format!(
            "rescale ratio must be finite, got {r}"
        ))),
        Some(r) if r > 0.0 => Ok(Some(r)),
        _ => Ok(None),
    }
}

/// Run every stage and keep all intermediates.
pub(crate) fn run_stages(
    volume: &Volume,
    rescale_ratio: Option<f32>,
    config: &WorkflowConfig,
) -> Result<PipelineStages> {
    config.validate()?;
    let rescale_ratio = effective_rescale_ratio(rescale_ratio)?;
    validate_volume(volume)?;
    let structure = &config.structure;

    let mut normalized = normalize_intensity(volume, &structure.intensity_scaling);
    let mut truncate = structure.gaussian_truncate;
    if let Some(ratio) = rescale_ratio {
        normalized = rescale_min_max(&rescale_xy(&normalized, ratio)?);
        truncate *= ratio;
        tracing::info!("rescaled by {ratio} to {:?}", normalized.dim());
    }

    let smoothed = smooth_slice_by_slice(&normalized, structure.gaussian_sigma, truncate)?;
    let (log_response, preliminary_mask) = detect_blobs(
        &smoothed,
        structure.log_sigma,
        structure.log_cutoff,
        structure.min_area,
    )?;
    let mask_voxels = count_true(&preliminary_mask);
    tracing::info!("{mask_voxels} voxels in blob mask");

    let seeds = find_seeds(&normalized, &preliminary_mask, &config.seeds)?;
    let n_seeds = count_true(&seeds);
    tracing::info!("{n_seeds} seeds found");

    let separation = separate::run(&preliminary_mask, &seeds, config)?;
    let unassigned_mask_voxels = preliminary_mask
        .iter()
        .zip(separation.instances.iter())
        .filter(|&(&m, &l)| m && l == 0)
        .count();

    let finalized = finalize::run(&separation.instances, config);
    let (d, h, w) = normalized.dim();
    let stats = StageStats {
        shape: [d, h, w],
        mask_voxels,
        seeds: n_seeds,
        markers: separation.n_markers,
        instances: finalized.n_instances,
        unassigned_mask_voxels,
        foreground_voxels: count_nonzero(&finalized.segmentation),
        qc_passed: finalized.qc_passed,
    };
    tracing::debug!(?stats, "pipeline complete");

    Ok(PipelineStages {
        normalized,
        smoothed,
        log_response,
        preliminary_mask,
        seeds,
        markers: separation.markers,
        distance: separation.distance,
        instances: finalized.instances,
        segmentation: finalized.segmentation,
        stats,
    })
}

/// Named intermediates in recording order.
pub(crate) fn diagnostics_bundle(stages: &PipelineStages) -> DiagnosticsBundle {
    let mut bundle = DiagnosticsBundle::new();
    bundle.push(IM_NORM, DiagnosticArray::Float(stages.normalized.clone()));
    bundle.push(IM_SMOOTH, DiagnosticArray::Float(stages.smoothed.clone()));
    bundle.push(INTERM_MASK, DiagnosticArray::Mask(stages.preliminary_mask.clone()));
    bundle.push(INTERM_LOCAL_MAX, DiagnosticArray::Mask(stages.seeds.clone()));
    bundle.push(BW_FINAL, DiagnosticArray::Byte(stages.segmentation.clone()));
    bundle
}

/// Hand the final segmentation to the selected output.
pub(crate) fn dispatch(
    stages: PipelineStages,
    mode: OutputMode<'_>,
    config: &WorkflowConfig,
    writer: &dyn VolumeWriter,
) -> Result<SegmentationOutput> {
    match mode {
        OutputMode::Save {
            output_dir,
            base_name,
        } => {
            std::fs::create_dir_all(output_dir)?;
            let path = output_dir.join(format!("{base_name}{}.tiff", config.output_suffix));
            writer.write(&path, &stages.segmentation)?;
            tracing::info!("saved segmentation to {}", path.display());
            Ok(SegmentationOutput::Saved { path })
        }
        OutputMode::Array => Ok(SegmentationOutput::Array(stages.segmentation)),
        OutputMode::ArrayWithContour => {
            let contour = segmentation_contour(&stages.segmentation);
            Ok(SegmentationOutput::ArrayWithContour {
                segmentation: stages.segmentation,
                contour,
            })
        }
        OutputMode::Customize {
            output_dir,
            base_name,
            sink,
        } => {
            let bundle = diagnostics_bundle(&stages);
            sink.consume(&bundle, output_dir, base_name)?;
            tracing::info!("{} intermediates handed to custom output", bundle.len());
            Ok(SegmentationOutput::Customized)
        }
    }
}
