//! Punctum detection: LoG blob mask and watershed seeds.

pub mod blob;
pub mod seeds;

pub use blob::{detect_blobs, log_response, LOG_TRUNCATE};
pub use seeds::{find_peaks, find_seeds, maximum_filter_cube, Peak};
