//! Soil thermal profile decoder
//!
//! The thermal profile (node spacing and cumulative node depth) is stored
//! once per cell, ahead of the tile/band blocks, and lands in the soil
//! parameters rather than the state aggregate: the integration loop treats
//! it as part of the soil configuration. A stored profile that reaches below
//! the configured damping depth is not fatal; the damping depth is widened
//! to match so the two stay mutually consistent, and the repair is reported.

use crate::codec::StateCodec;
use crate::config::{RestoreConfig, SoilParams};

use super::errors::StateResult;
use super::RestoreWarning;

/// Tolerance for comparing the deepest node against the damping depth.
const DEPTH_TOLERANCE: f64 = 1e-12;

/// Reads the thermal node spacing and cumulative depth arrays, normalizes
/// the single-node case, and repairs the damping depth bound.
pub(crate) fn decode_thermal_profile<C: StateCodec>(
    codec: &mut C,
    config: &RestoreConfig,
    soil: &mut SoilParams,
    warnings: &mut Vec<RestoreWarning>,
) -> StateResult<()> {
    let nodes = config.node_count;

    let mut dz_node = Vec::with_capacity(nodes);
    for _ in 0..nodes {
        dz_node.push(codec.read_double()?);
    }
    let mut zsum_node = Vec::with_capacity(nodes);
    for _ in 0..nodes {
        zsum_node.push(codec.read_double()?);
    }

    // A single-node profile has no meaningful spacing or depth.
    if nodes == 1 {
        dz_node[0] = 0.0;
        zsum_node[0] = 0.0;
    }

    if let Some(&deepest) = zsum_node.last() {
        if deepest - soil.damping_depth > DEPTH_TOLERANCE {
            warnings.push(RestoreWarning::DampingDepthWidened {
                observed: deepest,
                configured: soil.damping_depth,
            });
            soil.damping_depth = deepest;
        }
    }

    soil.dz_node = dz_node;
    soil.zsum_node = zsum_node;
    Ok(())
}
