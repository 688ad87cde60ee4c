//! Output adapter: mode selection, diagnostics, contour and TIFF I/O.

pub mod contour;
pub mod diagnostics;
pub mod io;
pub mod mode;

pub use contour::segmentation_contour;
pub use diagnostics::{DiagnosticArray, DiagnosticsBundle, DiagnosticsSink, TiffDiagnosticsSink};
pub use io::{read_volume, write_float_volume, write_segmentation, TiffVolumeWriter, VolumeWriter};
pub use mode::{OutputKind, OutputMode, SegmentationOutput};
