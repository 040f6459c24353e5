//! Tile/band state decoder
//!
//! The bulk of a cell record: for every tile a storm record, then for every
//! band with positive area fraction an identity pair, the per-branch soil
//! moisture/ice and canopy storage, one snow record, and the thermal node
//! temperature profile. Zero-area bands carry no data in the file and
//! consume nothing here, matching the writer's convention. The wetland tile
//! (the extra index when a lake is present) occurs in band 0 only.

use crate::codec::{CellRecordHeader, StateCodec};
use crate::config::{RestoreConfig, SoilParams};
use crate::state::CellState;

use super::errors::{StateError, StateResult};
use super::RestoreWarning;

/// Decodes every tile/band block of the matched record into the aggregate.
pub(crate) fn decode_tiles<C: StateCodec>(
    codec: &mut C,
    header: &CellRecordHeader,
    config: &RestoreConfig,
    soil: &SoilParams,
    state: &mut CellState,
    warnings: &mut Vec<RestoreWarning>,
) -> StateResult<()> {
    for tile in 0..header.total_tiles() {
        // Storm record: one per tile, independent of bands.
        state.mu[tile] = codec.read_double()?;
        state.still_storm[tile] = codec.read_char()? != 0;
        state.dry_time[tile] = codec.read_int()?;

        let is_wetland = header.has_wetland && tile == header.tile_count;
        let bands = if is_wetland { 1 } else { header.band_count };

        for band in 0..bands {
            // Zero-area bands carry no data in the file.
            if soil.area_fract[band] <= 0.0 {
                continue;
            }

            let stored_tile = codec.read_int()?;
            let stored_band = codec.read_int()?;
            if stored_tile != tile as i32 || stored_band != band as i32 {
                return Err(StateError::order_mismatch(
                    stored_tile,
                    stored_band,
                    tile,
                    band,
                ));
            }

            for branch in 0..config.branch_count() {
                decode_branch(
                    codec, header, soil, state, warnings, branch, tile, band, is_wetland,
                )?;
            }

            decode_snow(codec, state, tile, band)?;

            for temp in state.energy[tile][band].node_temp.iter_mut() {
                *temp = codec.read_double()?;
            }
        }
    }
    Ok(())
}

/// Decodes one distribution branch: soil moisture, soil ice, and canopy
/// interception for tiles that carry vegetation.
#[allow(clippy::too_many_arguments)]
fn decode_branch<C: StateCodec>(
    codec: &mut C,
    header: &CellRecordHeader,
    soil: &SoilParams,
    state: &mut CellState,
    warnings: &mut Vec<RestoreWarning>,
    branch: usize,
    tile: usize,
    band: usize,
    is_wetland: bool,
) -> StateResult<()> {
    let layers = &mut state.soil[branch][tile][band].layers;

    for (layer_idx, layer) in layers.iter_mut().enumerate() {
        let stored = codec.read_double()?;
        let max = soil.max_moist[layer_idx];
        if stored > max {
            warnings.push(RestoreWarning::MoistureClamped {
                tile,
                band,
                layer: layer_idx,
                stored,
                max,
            });
            layer.moist = max;
        } else {
            layer.moist = stored;
        }
    }

    for layer in layers.iter_mut() {
        for ice in layer.ice.iter_mut() {
            *ice = codec.read_double()?;
        }
    }

    // Canopy storage exists for tiles that carry vegetation: natural tiles,
    // and the wetland tile when a lake is present.
    let carries_vegetation = tile < header.tile_count || is_wetland;
    if carries_vegetation {
        state.veg[branch][tile][band].wdew = codec.read_double()?;
    }
    Ok(())
}

/// Decodes the single snow record of a tile/band pair and derives depth.
fn decode_snow<C: StateCodec>(
    codec: &mut C,
    state: &mut CellState,
    tile: usize,
    band: usize,
) -> StateResult<()> {
    let snow = &mut state.snow[tile][band];
    snow.last_snow = codec.read_int()?;
    snow.melting = codec.read_char()? != 0;
    snow.coverage = codec.read_double()?;
    snow.swe = codec.read_double()?;
    snow.surf_temp = codec.read_double()?;
    snow.surf_water = codec.read_double()?;
    snow.pack_temp = codec.read_double()?;
    snow.pack_water = codec.read_double()?;
    snow.density = codec.read_double()?;
    snow.cold_content = codec.read_double()?;
    snow.canopy_snow = codec.read_double()?;

    // Depth is derivable only when the pack has density.
    if snow.density > 0.0 {
        snow.depth = 1000.0 * snow.swe / snow.density;
    }
    Ok(())
}
