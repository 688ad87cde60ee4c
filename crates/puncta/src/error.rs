//! Error type shared by the pipeline, the primitives and the output adapter.

/// Errors raised by a segmentation run.
///
/// Configuration errors are reported before any computation starts, so a
/// failed run never leaves a partially written output behind.
#[derive(Debug, thiserror::Error)]
pub enum SegmentationError {
    /// The output mode tag is not one of the supported modes.
    #[error("unsupported output mode: {0:?}")]
    UnsupportedOutputMode(String),
    /// A parameter required by the selected output mode was not supplied.
    #[error("output mode `{mode}` requires `{parameter}`")]
    MissingParameter {
        /// Mode tag that was requested.
        mode: &'static str,
        /// Name of the missing parameter.
        parameter: &'static str,
    },
    /// A workflow parameter is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The input volume violates a primitive precondition.
    #[error("invalid volume: {0}")]
    InvalidVolume(String),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),
    /// Failure reported by a caller-supplied diagnostics sink.
    #[error("diagnostics sink failed: {0}")]
    Sink(String),
}

impl SegmentationError {
    /// True for errors that stem from an invalid request rather than from a
    /// failing primitive or I/O.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOutputMode(_) | Self::MissingParameter { .. } | Self::InvalidConfig(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = SegmentationError> = std::result::Result<T, E>;
