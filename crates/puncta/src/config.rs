//! Workflow parameters.
//!
//! The six numeric constants of a structure preset live in [`StructureParams`];
//! everything the pipeline needs beyond them (seed detection, QC, marker
//! connectivity, output naming) is grouped in [`WorkflowConfig`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SegmentationError};
use crate::volume::Connectivity;

/// Intensity window used by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntensityScaling {
    /// Window `[mean - lower*std, mean + upper*std]`, limited to the data range.
    MeanStd { lower: f32, upper: f32 },
    /// Like [`IntensityScaling::MeanStd`], but statistics are fitted on
    /// voxels strictly inside `(valid_min, valid_max)` and the window is
    /// bounded by those absolute values.
    MeanStdBounded {
        lower: f32,
        upper: f32,
        valid_min: f32,
        valid_max: f32,
    },
    /// Plain min–max scaling. Voxels above `upper_bound` are replaced by the
    /// volume minimum before scaling.
    MinMax { upper_bound: Option<f32> },
}

impl Default for IntensityScaling {
    fn default() -> Self {
        Self::MeanStd {
            lower: 2.0,
            upper: 36.0,
        }
    }
}

/// Fixed per-structure constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureParams {
    /// Normalization window.
    pub intensity_scaling: IntensityScaling,
    /// Sigma of the slice-wise Gaussian smoothing (voxels).
    pub gaussian_sigma: f32,
    /// Smoothing kernel half-width in units of sigma.
    pub gaussian_truncate: f32,
    /// Scale of the LoG blob response (voxels).
    pub log_sigma: f32,
    /// Blob response cutoff.
    pub log_cutoff: f32,
    /// Minimum object size in voxels, used before and after the watershed.
    pub min_area: usize,
}

impl StructureParams {
    /// Preset tuned for SLC25A17 puncta.
    pub fn slc25a17() -> Self {
        Self {
            intensity_scaling: IntensityScaling::MeanStd {
                lower: 2.0,
                upper: 36.0,
            },
            gaussian_sigma: 1.0,
            gaussian_truncate: 3.0,
            log_sigma: 1.0,
            log_cutoff: 0.045,
            min_area: 3,
        }
    }
}

impl Default for StructureParams {
    fn default() -> Self {
        Self::slc25a17()
    }
}

/// Local-maximum search used for watershed seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    /// Half-width of the cubic max-filter footprint; kept peaks are at least
    /// this far apart (Chebyshev distance). Seed count is sensitive to it.
    pub min_distance: usize,
    /// Ignore regions closer than `min_distance` voxels to any face.
    pub exclude_border: bool,
    /// Absolute intensity a peak must exceed. `None` uses the volume minimum.
    pub threshold_abs: Option<f32>,
    /// Fraction of the volume maximum a peak must exceed.
    pub threshold_rel: Option<f32>,
    /// Cap on peaks kept per mask region.
    pub num_peaks_per_label: Option<usize>,
    /// Cap on peaks kept overall. When more are found, the brightest are
    /// spacing-filtered again across regions before truncation.
    pub num_peaks: Option<usize>,
    /// Adjacency used to split the mask into regions.
    pub label_connectivity: Connectivity,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            min_distance: 2,
            exclude_border: true,
            threshold_abs: None,
            threshold_rel: None,
            num_peaks_per_label: None,
            num_peaks: None,
            label_connectivity: Connectivity::Full,
        }
    }
}

/// Quality-control check run on the final mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConfig {
    /// Warn when fewer foreground voxels than this are segmented.
    pub min_foreground_voxels: usize,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            min_foreground_voxels: 50_000,
        }
    }
}

/// Complete workflow configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub structure: StructureParams,
    pub seeds: PeakConfig,
    pub qc: QcConfig,
    /// Adjacency used to label dilated seeds into watershed markers.
    pub marker_connectivity: Connectivity,
    /// Suffix appended to the base name when saving the final mask.
    pub output_suffix: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            structure: StructureParams::default(),
            seeds: PeakConfig::default(),
            qc: QcConfig::default(),
            marker_connectivity: Connectivity::Face,
            output_suffix: "_struct_segmentation".to_string(),
        }
    }
}

impl WorkflowConfig {
    /// Load a JSON configuration. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data).map_err(|e| {
            SegmentationError::InvalidConfig(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let s = &self.structure;
        let positive = [
            ("gaussian_sigma", s.gaussian_sigma),
            ("gaussian_truncate", s.gaussian_truncate),
            ("log_sigma", s.log_sigma),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SegmentationError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !s.log_cutoff.is_finite() {
            return Err(SegmentationError::InvalidConfig(
                "log_cutoff must be finite".to_string(),
            ));
        }
        match s.intensity_scaling {
            IntensityScaling::MeanStd { lower, upper }
            | IntensityScaling::MeanStdBounded { lower, upper, .. }
                if lower < 0.0 || upper < 0.0 =>
            {
                return Err(SegmentationError::InvalidConfig(format!(
                    "intensity scaling factors must be non-negative, got [{lower}, {upper}]"
                )));
            }
            IntensityScaling::MeanStdBounded {
                valid_min,
                valid_max,
                ..
            } if valid_min >= valid_max => {
                return Err(SegmentationError::InvalidConfig(format!(
                    "empty intensity validity range ({valid_min}, {valid_max})"
                )));
            }
            _ => {}
        }
        if let Some(rel) = self.seeds.threshold_rel {
            if !(0.0..=1.0).contains(&rel) {
                return Err(SegmentationError::InvalidConfig(format!(
                    "threshold_rel must lie in [0, 1], got {rel}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_matches_structure_constants() {
        let p = StructureParams::slc25a17();
        assert_eq!(
            p.intensity_scaling,
            IntensityScaling::MeanStd {
                lower: 2.0,
                upper: 36.0
            }
        );
        assert_eq!(p.gaussian_sigma, 1.0);
        assert_eq!(p.gaussian_truncate, 3.0);
        assert_eq!(p.log_sigma, 1.0);
        assert_eq!(p.log_cutoff, 0.045);
        assert_eq!(p.min_area, 3);
        assert!(WorkflowConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "structure": { "log_cutoff": 0.03 }, "seeds": { "min_distance": 3 } }"#;
        let cfg: WorkflowConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.structure.log_cutoff, 0.03);
        assert_eq!(cfg.structure.min_area, 3);
        assert_eq!(cfg.seeds.min_distance, 3);
        assert!(cfg.seeds.exclude_border);
        assert_eq!(cfg.qc.min_foreground_voxels, 50_000);
        assert_eq!(cfg.output_suffix, "_struct_segmentation");
    }

    #[test]
    fn scaling_variants_roundtrip_through_json() {
        let cfg = WorkflowConfig {
            structure: StructureParams {
                intensity_scaling: IntensityScaling::MinMax {
                    upper_bound: Some(4000.0),
                },
                ..Default::default()
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains(r#""kind":"min_max""#));
        let back: WorkflowConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        let mut cfg = WorkflowConfig::default();
        cfg.structure.gaussian_sigma = 0.0;
        assert!(cfg.validate().unwrap_err().is_configuration_error());

        let mut cfg = WorkflowConfig::default();
        cfg.structure.intensity_scaling = IntensityScaling::MeanStdBounded {
            lower: 1.0,
            upper: 2.0,
            valid_min: 10.0,
            valid_max: 5.0,
        };
        assert!(cfg.validate().is_err());

        let mut cfg = WorkflowConfig::default();
        cfg.seeds.threshold_rel = Some(1.5);
        assert!(cfg.validate().is_err());
    }
}
