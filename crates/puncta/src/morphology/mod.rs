//! Binary and label morphology on 3D volumes.
//!
//! Building blocks for the instance separator: component labeling, size
//! filtering, ball dilation, the Euclidean distance transform and the
//! marker-controlled watershed.

pub mod dilate;
pub mod distance;
pub mod label;
pub mod small_objects;
pub mod watershed;

pub use dilate::{ball_offsets, binary_dilation, binary_erosion, binary_opening};
pub use distance::euclidean_distance_transform;
pub use label::{bounding_boxes, label_components, label_sizes, BoundingBox};
pub use small_objects::{remove_small_labels, remove_small_objects};
pub use watershed::{watershed, WatershedOptions};
