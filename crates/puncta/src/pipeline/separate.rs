//! Instance separation: seeds → markers → watershed on the distance map.

use super::*;

pub(super) struct Separation {
    pub markers: Labels,
    pub n_markers: usize,
    pub distance: Volume,
    pub instances: Labels,
}

pub(super) fn run(mask: &Mask, seeds: &Mask, config: &WorkflowConfig) -> Result<Separation> {
    let grown = binary_dilation(seeds, &ball_offsets(1));
    let (markers, n_markers) = label_components(&grown, config.marker_connectivity);
    let distance = euclidean_distance_transform(mask);
    let elevation = distance.mapv(|d| -d);
    let instances = watershed(
        &elevation,
        &markers,
        Some(mask),
        WatershedOptions {
            connectivity: Connectivity::Face,
            watershed_line: true,
        },
    )?;
    tracing::info!("{n_markers} watershed markers");
    Ok(Separation {
        markers,
        n_markers,
        distance,
        instances,
    })
}
