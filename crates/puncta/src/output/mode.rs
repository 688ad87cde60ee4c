//! Output mode selection and dispatch results.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, SegmentationError};
use crate::output::diagnostics::DiagnosticsSink;
use crate::volume::Segmentation;

/// Tag of an output mode, as accepted on string-based entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Save the final mask to disk.
    Default,
    Array,
    ArrayWithContour,
    /// Hand all intermediates to a caller-supplied sink.
    Customize,
}

impl OutputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Array => "array",
            Self::ArrayWithContour => "array_with_contour",
            Self::Customize => "customize",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputKind {
    type Err = SegmentationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(Self::Default),
            "array" => Ok(Self::Array),
            "array_with_contour" => Ok(Self::ArrayWithContour),
            "customize" => Ok(Self::Customize),
            other => Err(SegmentationError::UnsupportedOutputMode(other.to_string())),
        }
    }
}

/// Where the final segmentation goes, with the parameters each mode needs.
pub enum OutputMode<'a> {
    Save {
        output_dir: &'a Path,
        base_name: &'a str,
    },
    Array,
    ArrayWithContour,
    Customize {
        output_dir: &'a Path,
        base_name: &'a str,
        sink: &'a mut dyn DiagnosticsSink,
    },
}

impl<'a> OutputMode<'a> {
    /// Assemble a mode from loose parameters, checking that the ones the mode
    /// needs are present.
    pub fn from_parts(
        kind: OutputKind,
        output_dir: Option<&'a Path>,
        base_name: Option<&'a str>,
        sink: Option<&'a mut dyn DiagnosticsSink>,
    ) -> Result<Self> {
        let require_dir = |mode| {
            output_dir.ok_or(SegmentationError::MissingParameter {
                mode,
                parameter: "output_path",
            })
        };
        let require_name = |mode| {
            base_name.ok_or(SegmentationError::MissingParameter {
                mode,
                parameter: "base_name",
            })
        };
        match kind {
            OutputKind::Default => Ok(Self::Save {
                output_dir: require_dir("default")?,
                base_name: require_name("default")?,
            }),
            OutputKind::Array => Ok(Self::Array),
            OutputKind::ArrayWithContour => Ok(Self::ArrayWithContour),
            OutputKind::Customize => {
                let output_dir = require_dir("customize")?;
                let base_name = require_name("customize")?;
                let sink = sink.ok_or(SegmentationError::MissingParameter {
                    mode: "customize",
                    parameter: "output_callback",
                })?;
                Ok(Self::Customize {
                    output_dir,
                    base_name,
                    sink,
                })
            }
        }
    }

    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Save { .. } => OutputKind::Default,
            Self::Array => OutputKind::Array,
            Self::ArrayWithContour => OutputKind::ArrayWithContour,
            Self::Customize { .. } => OutputKind::Customize,
        }
    }
}

impl fmt::Debug for OutputMode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Save {
                output_dir,
                base_name,
            } => f
                .debug_struct("Save")
                .field("output_dir", output_dir)
                .field("base_name", base_name)
                .finish(),
            Self::Array => f.write_str("Array"),
            Self::ArrayWithContour => f.write_str("ArrayWithContour"),
            Self::Customize {
                output_dir,
                base_name,
                ..
            } => f
                .debug_struct("Customize")
                .field("output_dir", output_dir)
                .field("base_name", base_name)
                .finish_non_exhaustive(),
        }
    }
}

/// Result of a run, shaped by the output mode.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationOutput {
    /// The final mask was written to `path`.
    Saved { path: PathBuf },
    Array(Segmentation),
    ArrayWithContour {
        segmentation: Segmentation,
        contour: Segmentation,
    },
    /// The diagnostics sink received the bundle.
    Customized,
}

impl SegmentationOutput {
    /// The in-memory segmentation, when the mode returns one.
    pub fn segmentation(&self) -> Option<&Segmentation> {
        match self {
            Self::Array(seg) | Self::ArrayWithContour { segmentation: seg, .. } => Some(seg),
            Self::Saved { .. } | Self::Customized => None,
        }
    }
}
