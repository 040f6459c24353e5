//! Cell state restore
//!
//! Restores one cell's simulation state from an open model state stream:
//!
//! 1. The locator scans for the record whose header names the requested
//!    cell, skipping non-matching records codec-exactly.
//! 2. The validator gates decoding on structural agreement between the
//!    record header and the restart configuration.
//! 3. The thermal profile, tile/band, and (when configured) lake decoders
//!    fill the caller-owned aggregate in place.
//!
//! The restore is single-threaded, synchronous, and consumes the stream at
//! most once per lookup. It never allocates the aggregate and never
//! recovers from a malformed file: repairs are limited to moisture clamping
//! and damping-depth widening, both reported as warnings.

mod decoder;
mod errors;
mod lake;
mod locator;
mod thermal;
mod validator;

pub use errors::{Severity, StateError, StateErrorCode, StateResult};
pub use locator::locate_cell;
pub use validator::validate_header;

use std::fmt;
use std::io::{Read, Seek};

use crate::codec::{BinaryCodec, StateCodec, TextCodec};
use crate::config::{Encoding, LakeParams, RestoreConfig, SoilParams};
use crate::observability::{Logger, Severity as LogSeverity};
use crate::state::CellState;

/// A non-fatal repair applied while decoding. Decoding continued.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreWarning {
    /// A stored soil moisture value exceeded its layer's capacity and was
    /// clamped to it.
    MoistureClamped {
        tile: usize,
        band: usize,
        layer: usize,
        stored: f64,
        max: f64,
    },
    /// The stored thermal profile reached below the configured damping
    /// depth, which was widened to match.
    DampingDepthWidened { observed: f64, configured: f64 },
}

impl RestoreWarning {
    /// Log event name for this warning.
    pub fn event(&self) -> &'static str {
        match self {
            RestoreWarning::MoistureClamped { .. } => "soil_moisture_clamped",
            RestoreWarning::DampingDepthWidened { .. } => "damping_depth_widened",
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            RestoreWarning::MoistureClamped {
                tile,
                band,
                layer,
                stored,
                max,
            } => vec![
                ("tile", tile.to_string()),
                ("band", band.to_string()),
                ("layer", layer.to_string()),
                ("stored", stored.to_string()),
                ("max", max.to_string()),
            ],
            RestoreWarning::DampingDepthWidened {
                observed,
                configured,
            } => vec![
                ("observed", observed.to_string()),
                ("configured", configured.to_string()),
            ],
        }
    }
}

impl fmt::Display for RestoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestoreWarning::MoistureClamped {
                tile,
                band,
                layer,
                stored,
                max,
            } => write!(
                f,
                "Stored soil moisture in layer {layer} of tile {tile}, band {band} ({stored}) \
                 exceeds the maximum soil moisture; reset to {max}."
            ),
            RestoreWarning::DampingDepthWidened {
                observed,
                configured,
            } => write!(
                f,
                "Deepest thermal node ({observed}) in the model state file exceeds the \
                 defined damping depth ({configured}); damping depth reset."
            ),
        }
    }
}

/// Outcome of a successful restore.
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    /// Non-fatal repairs applied during decoding, in stream order.
    pub warnings: Vec<RestoreWarning>,
}

/// Restores the state of `target_cell` from an open stream, constructing
/// the codec the configuration's encoding calls for.
pub fn read_model_state<R: Read + Seek>(
    stream: R,
    target_cell: i32,
    config: &RestoreConfig,
    soil: &mut SoilParams,
    lake: &LakeParams,
    state: &mut CellState,
) -> StateResult<RestoreReport> {
    match config.encoding {
        Encoding::Binary => {
            let mut codec = BinaryCodec::new(stream);
            read_cell_state(&mut codec, target_cell, config, soil, lake, state)
        }
        Encoding::Text => {
            let mut codec = TextCodec::new(stream);
            read_cell_state(&mut codec, target_cell, config, soil, lake, state)
        }
    }
}

/// Restores the state of `target_cell` through an already-constructed codec.
pub fn read_cell_state<C: StateCodec>(
    codec: &mut C,
    target_cell: i32,
    config: &RestoreConfig,
    soil: &mut SoilParams,
    lake: &LakeParams,
    state: &mut CellState,
) -> StateResult<RestoreReport> {
    check_shapes(config, soil, lake, state)?;

    let header = locator::locate_cell(codec, target_cell, config)?;
    validator::validate_header(&header, config, lake)?;

    let mut warnings = Vec::new();
    thermal::decode_thermal_profile(codec, config, soil, &mut warnings)?;
    decoder::decode_tiles(codec, &header, config, soil, state, &mut warnings)?;

    if config.lakes_enabled && lake.has_lake() {
        let lake_state = state
            .lake
            .as_mut()
            .ok_or_else(|| StateError::invalid_config("aggregate has no lake state slot"))?;
        lake::decode_lake(codec, lake, lake_state)?;
    }

    for warning in &warnings {
        Logger::log_stderr(LogSeverity::Warn, warning.event(), &warning.fields());
    }
    Logger::log(
        LogSeverity::Info,
        "cell_state_restored",
        &[
            ("cell", target_cell.to_string()),
            ("warnings", warnings.len().to_string()),
        ],
    );

    Ok(RestoreReport { warnings })
}

/// Verifies that the configuration, parameters, and caller-allocated
/// aggregate agree in shape before any stream consumption.
fn check_shapes(
    config: &RestoreConfig,
    soil: &SoilParams,
    lake: &LakeParams,
    state: &CellState,
) -> StateResult<()> {
    if soil.max_moist.len() != config.layer_count {
        return Err(StateError::invalid_config(format!(
            "max_moist has {} layers, configuration has {}",
            soil.max_moist.len(),
            config.layer_count
        )));
    }
    if soil.area_fract.len() != config.band_count {
        return Err(StateError::invalid_config(format!(
            "area_fract has {} bands, configuration has {}",
            soil.area_fract.len(),
            config.band_count
        )));
    }

    let has_wetland = config.lakes_enabled && lake.has_lake();
    let tiles = config.tile_count + usize::from(has_wetland);
    let branches = config.branch_count();

    if state.mu.len() != tiles
        || state.still_storm.len() != tiles
        || state.dry_time.len() != tiles
    {
        return Err(StateError::invalid_config(format!(
            "aggregate holds {} tiles, configuration implies {}",
            state.mu.len(),
            tiles
        )));
    }

    let soil_ok = state.soil.len() == branches
        && state.soil.iter().all(|branch| {
            branch.len() == tiles
                && branch.iter().all(|tile| {
                    tile.len() == config.band_count
                        && tile.iter().all(|band| {
                            band.layers.len() == config.layer_count
                                && band
                                    .layers
                                    .iter()
                                    .all(|l| l.ice.len() == config.ice_values_per_layer())
                        })
                })
        });
    let veg_ok = state.veg.len() == branches
        && state.veg.iter().all(|branch| {
            branch.len() == tiles && branch.iter().all(|tile| tile.len() == config.band_count)
        });
    let snow_ok = state.snow.len() == tiles
        && state.snow.iter().all(|tile| tile.len() == config.band_count);
    let energy_ok = state.energy.len() == tiles
        && state.energy.iter().all(|tile| {
            tile.len() == config.band_count
                && tile.iter().all(|band| band.node_temp.len() == config.node_count)
        });
    if !(soil_ok && veg_ok && snow_ok && energy_ok) {
        return Err(StateError::invalid_config(
            "aggregate shape does not match the restart configuration",
        ));
    }

    match (&state.lake, has_wetland) {
        (Some(lake_state), true) => {
            let nodes = lake.node_count;
            if lake_state.surface.len() != nodes
                || lake_state.temp.len() != nodes
                || lake_state.density.len() != nodes
            {
                return Err(StateError::invalid_config(format!(
                    "lake state arrays sized for {} nodes, lake parameters have {}",
                    lake_state.temp.len(),
                    nodes
                )));
            }
        }
        (None, false) => {}
        (Some(_), false) => {
            return Err(StateError::invalid_config(
                "aggregate carries lake state but no lake is configured",
            ));
        }
        (None, true) => {
            return Err(StateError::invalid_config(
                "lake configured but aggregate has no lake state slot",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RestoreConfig {
        RestoreConfig {
            encoding: Encoding::Binary,
            tile_count: 2,
            band_count: 1,
            layer_count: 2,
            node_count: 2,
            frost_subareas: None,
            distributed_precip: false,
            lakes_enabled: false,
            rewind: true,
        }
    }

    fn soil() -> SoilParams {
        SoilParams {
            max_moist: vec![500.0, 400.0],
            area_fract: vec![1.0],
            damping_depth: 4.0,
            dz_node: Vec::new(),
            zsum_node: Vec::new(),
        }
    }

    #[test]
    fn test_shape_check_accepts_matching_aggregate() {
        let config = config();
        let state = CellState::new(&config, &LakeParams::none());
        assert!(check_shapes(&config, &soil(), &LakeParams::none(), &state).is_ok());
    }

    #[test]
    fn test_shape_check_rejects_wrong_layer_count() {
        let config = config();
        let state = CellState::new(&config, &LakeParams::none());
        let mut soil = soil();
        soil.max_moist.pop();
        let err = check_shapes(&config, &soil, &LakeParams::none(), &state).unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateInvalidConfig);
    }

    #[test]
    fn test_shape_check_rejects_foreign_aggregate() {
        let config = config();
        let mut other = config.clone();
        other.tile_count = 3;
        let state = CellState::new(&other, &LakeParams::none());
        let err = check_shapes(&config, &soil(), &LakeParams::none(), &state).unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateInvalidConfig);
        assert!(err.message().contains("3"));
    }

    #[test]
    fn test_shape_check_requires_lake_slot() {
        let mut config = config();
        config.lakes_enabled = true;
        let lake = LakeParams {
            coverage: 0.5,
            node_count: 3,
        };
        // Aggregate allocated without the lake.
        let state = CellState::new(
            &RestoreConfig {
                lakes_enabled: false,
                ..config.clone()
            },
            &LakeParams::none(),
        );
        let err = check_shapes(&config, &soil(), &lake, &state).unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateInvalidConfig);
    }

    #[test]
    fn test_warning_display_names_location() {
        let warning = RestoreWarning::MoistureClamped {
            tile: 2,
            band: 0,
            layer: 1,
            stored: 550.0,
            max: 500.0,
        };
        let text = warning.to_string();
        assert!(text.contains("layer 1"));
        assert!(text.contains("tile 2"));
        assert!(text.contains("band 0"));
        assert!(text.contains("500"));
        assert_eq!(warning.event(), "soil_moisture_clamped");
    }
}
