//! Named intermediates of one run and the sinks that consume them.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::output::io::{write_float_volume, write_segmentation};
use crate::volume::{Mask, Segmentation, Volume, FOREGROUND};

pub const IM_NORM: &str = "im_norm";
pub const IM_SMOOTH: &str = "im_smooth";
pub const INTERM_MASK: &str = "interm_mask";
pub const INTERM_LOCAL_MAX: &str = "interm_local_max";
pub const BW_FINAL: &str = "bw_final";

/// One recorded intermediate.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticArray {
    Float(Volume),
    Mask(Mask),
    Byte(Segmentation),
}

impl DiagnosticArray {
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            Self::Float(v) => v.dim(),
            Self::Mask(m) => m.dim(),
            Self::Byte(b) => b.dim(),
        }
    }
}

/// Ordered, append-only collection of named intermediates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticsBundle {
    entries: Vec<(String, DiagnosticArray)>,
}

impl DiagnosticsBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, array: DiagnosticArray) {
        self.entries.push((name.to_string(), array));
    }

    pub fn entries(&self) -> &[(String, DiagnosticArray)] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// First entry recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&DiagnosticArray> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Receiver of the diagnostics bundle in customize mode.
pub trait DiagnosticsSink {
    fn consume(&mut self, bundle: &DiagnosticsBundle, output_dir: &Path, base_name: &str)
        -> Result<()>;
}

impl<F> DiagnosticsSink for F
where
    F: FnMut(&DiagnosticsBundle, &Path, &str) -> Result<()>,
{
    fn consume(
        &mut self,
        bundle: &DiagnosticsBundle,
        output_dir: &Path,
        base_name: &str,
    ) -> Result<()> {
        self(bundle, output_dir, base_name)
    }
}

/// Writes every bundle entry to `<output_dir>/<base_name>_<entry>.tiff`.
///
/// Float intermediates become `Gray32Float` pages; masks are written as 0/255.
#[derive(Debug, Clone, Default)]
pub struct TiffDiagnosticsSink {
    written: Vec<PathBuf>,
}

impl TiffDiagnosticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files written so far, in bundle order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DiagnosticsSink for TiffDiagnosticsSink {
    fn consume(
        &mut self,
        bundle: &DiagnosticsBundle,
        output_dir: &Path,
        base_name: &str,
    ) -> Result<()> {
        std::fs::create_dir_all(output_dir)?;
        for (name, array) in bundle.entries() {
            let path = output_dir.join(format!("{base_name}_{name}.tiff"));
            match array {
                DiagnosticArray::Float(v) => write_float_volume(&path, v)?,
                DiagnosticArray::Mask(m) => {
                    write_segmentation(&path, &m.mapv(|b| if b { FOREGROUND } else { 0 }))?
                }
                DiagnosticArray::Byte(b) => write_segmentation(&path, b)?,
            }
            tracing::debug!("wrote {}", path.display());
            self.written.push(path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SegmentationError;

    fn bundle() -> DiagnosticsBundle {
        let mut b = DiagnosticsBundle::new();
        b.push(IM_NORM, DiagnosticArray::Float(Volume::zeros((1, 2, 2))));
        b.push(INTERM_MASK, DiagnosticArray::Mask(Mask::from_elem((1, 2, 2), true)));
        b.push(BW_FINAL, DiagnosticArray::Byte(Segmentation::zeros((1, 2, 2))));
        b
    }

    #[test]
    fn bundle_keeps_insertion_order() {
        let b = bundle();
        assert_eq!(b.names().collect::<Vec<_>>(), vec![IM_NORM, INTERM_MASK, BW_FINAL]);
        assert_eq!(b.get(INTERM_MASK).map(|a| a.dim()), Some((1, 2, 2)));
        assert!(b.get(IM_SMOOTH).is_none());
    }

    #[test]
    fn closures_act_as_sinks() {
        let mut seen = Vec::new();
        let mut sink = |b: &DiagnosticsBundle, _: &Path, base: &str| -> Result<()> {
            seen.push(format!("{base}:{}", b.len()));
            Ok(())
        };
        sink.consume(&bundle(), Path::new("."), "cell").unwrap();
        assert_eq!(seen, vec!["cell:3"]);

        let mut failing = |_: &DiagnosticsBundle, _: &Path, _: &str| -> Result<()> {
            Err(SegmentationError::Sink("disk full".into()))
        };
        assert!(matches!(
            failing.consume(&bundle(), Path::new("."), "cell"),
            Err(SegmentationError::Sink(_))
        ));
    }

    #[test]
    fn tiff_sink_writes_one_file_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = TiffDiagnosticsSink::new();
        sink.consume(&bundle(), dir.path(), "cell").unwrap();
        assert_eq!(sink.written().len(), 3);
        assert!(dir.path().join("cell_interm_mask.tiff").exists());
        assert!(dir.path().join("cell_bw_final.tiff").exists());
    }
}
