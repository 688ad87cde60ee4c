//! Segmentation pipeline.
//!
//! Glue layer that wires the stages together:
//! normalize (+ optional XY rescale) -> smooth -> LoG blob mask -> seeds ->
//! marker watershed -> label filtering -> binarization -> output dispatch.
//!
//! Numeric primitives live in `crate::preprocess`, `crate::detect` and
//! `crate::morphology`; this layer owns stage order and data flow.

mod finalize;
mod prelude;
mod result;
mod run;
mod separate;

pub use finalize::binarize;
pub use result::{PipelineStages, RunSummary, StageStats, SUMMARY_SCHEMA_V1};

pub(crate) use prelude::*;

pub(crate) use run::{dispatch, run_stages};
