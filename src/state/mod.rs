//! Per-cell simulation state aggregate
//!
//! The aggregate is allocated once by the caller, shaped by the restart
//! configuration, and filled in place by the restore. The decoders never
//! allocate or resize it; a shape disagreement between the aggregate and the
//! configuration is a fatal configuration error caught before decoding.
//!
//! Indexing convention throughout:
//! `[branch][tile][band]` for moisture and canopy state (branch is the
//! wet/dry distributed-precipitation split), `[tile][band]` for snow and
//! thermal state, which are not branch-specific.

use crate::config::{LakeParams, RestoreConfig};

/// One soil layer's stored water for a (branch, tile, band) triple.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerState {
    /// Total soil moisture (mm). Never exceeds the layer's capacity in the
    /// restored state; stream values above it are clamped with a warning.
    pub moist: f64,
    /// Ice content (mm); one value per frost sub-area, or a single value
    /// when spatial frost is not modeled.
    pub ice: Vec<f64>,
}

/// Soil water state for one (branch, tile, band) triple.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoilState {
    pub layers: Vec<LayerState>,
}

/// Vegetation state for one (branch, tile, band) triple.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VegState {
    /// Canopy interception storage (mm).
    pub wdew: f64,
}

/// Snowpack state for one (tile, band) pair. Not branch-specific.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnowState {
    /// Days since the last snowfall.
    pub last_snow: i32,
    /// Whether the pack was melting when the state was written.
    pub melting: bool,
    /// Fractional snow coverage.
    pub coverage: f64,
    /// Snow-water-equivalent (m).
    pub swe: f64,
    /// Snow surface temperature (C).
    pub surf_temp: f64,
    /// Liquid water in the surface layer (m).
    pub surf_water: f64,
    /// Snow pack temperature (C).
    pub pack_temp: f64,
    /// Liquid water in the pack (m).
    pub pack_water: f64,
    /// Snow density (kg/m3).
    pub density: f64,
    /// Cold content of the pack (J/m2).
    pub cold_content: f64,
    /// Snow intercepted in the canopy (m).
    pub canopy_snow: f64,
    /// Snow depth (mm), derived from SWE and density when density is
    /// positive; left as allocated otherwise (a density of zero means the
    /// pack has no meaningful depth).
    pub depth: f64,
}

/// Soil thermal state for one (tile, band) pair. Not branch-specific.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyState {
    /// Temperature at each soil thermal node (C).
    pub node_temp: Vec<f64>,
}

/// Lake state for the cell, present only when the cell has a lake.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LakeState {
    /// Number of currently active lake nodes. At most the configured lake
    /// node count; only the first `active_nodes` entries of the per-node
    /// arrays are meaningful.
    pub active_nodes: usize,
    /// Lake water volume (m3).
    pub volume: f64,
    /// Lake depth (m).
    pub depth: f64,
    /// Lake surface area (m2).
    pub surface_area: f64,
    /// Bulk node thickness (m).
    pub dz: f64,
    /// Surface layer thickness (m).
    pub surf_dz: f64,
    /// Surface area at each node (m2).
    pub surface: Vec<f64>,
    /// Inflow water temperature (C).
    pub inflow_temp: f64,
    /// Average lake temperature (C).
    pub avg_temp: f64,
    /// Water temperature at each node (C).
    pub temp: Vec<f64>,
    /// Water density at each node (kg/m3).
    pub density: Vec<f64>,
    /// Deepest node the mixed layer has reached.
    pub mix_max: i32,
    /// Ice temperature (C).
    pub ice_temp: f64,
    /// Ice thickness (m).
    pub ice_height: f64,
    /// Fractional ice coverage.
    pub ice_fraction: f64,
    /// Snow-water-equivalent on the ice (m).
    pub snow_swe: f64,
    /// Snow depth on the ice (m).
    pub snow_depth: f64,
}

impl LakeState {
    /// Allocates lake state with per-node arrays sized to the configured
    /// lake node count.
    pub fn new(node_count: usize) -> Self {
        Self {
            surface: vec![0.0; node_count],
            temp: vec![0.0; node_count],
            density: vec![0.0; node_count],
            ..Self::default()
        }
    }
}

/// The complete per-cell state aggregate, owned by the caller and filled in
/// place by the restore.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellState {
    /// Wet-fraction weight per tile (one per tile, not per band).
    pub mu: Vec<f64>,
    /// Whether a storm was still in progress per tile.
    pub still_storm: Vec<bool>,
    /// Time since the last storm per tile (model steps).
    pub dry_time: Vec<i32>,
    /// Soil water state, indexed `[branch][tile][band]`.
    pub soil: Vec<Vec<Vec<SoilState>>>,
    /// Vegetation state, indexed `[branch][tile][band]`.
    pub veg: Vec<Vec<Vec<VegState>>>,
    /// Snowpack state, indexed `[tile][band]`.
    pub snow: Vec<Vec<SnowState>>,
    /// Soil thermal state, indexed `[tile][band]`.
    pub energy: Vec<Vec<EnergyState>>,
    /// Lake state; `Some` exactly when the cell has a configured lake.
    pub lake: Option<LakeState>,
}

impl CellState {
    /// Allocates an aggregate shaped by the restart configuration.
    ///
    /// The wetland tile slot is allocated across all bands for uniform
    /// indexing even though only band 0 is ever filled for it.
    pub fn new(config: &RestoreConfig, lake: &LakeParams) -> Self {
        let has_wetland = config.lakes_enabled && lake.has_lake();
        let tiles = config.tile_count + usize::from(has_wetland);
        let bands = config.band_count;
        let branches = config.branch_count();

        let layer = LayerState {
            moist: 0.0,
            ice: vec![0.0; config.ice_values_per_layer()],
        };
        let soil_state = SoilState {
            layers: vec![layer; config.layer_count],
        };
        let energy_state = EnergyState {
            node_temp: vec![0.0; config.node_count],
        };

        Self {
            mu: vec![0.0; tiles],
            still_storm: vec![false; tiles],
            dry_time: vec![0; tiles],
            soil: vec![vec![vec![soil_state; bands]; tiles]; branches],
            veg: vec![vec![vec![VegState::default(); bands]; tiles]; branches],
            snow: vec![vec![SnowState::default(); bands]; tiles],
            energy: vec![vec![energy_state; bands]; tiles],
            lake: if has_wetland {
                Some(LakeState::new(lake.node_count))
            } else {
                None
            },
        }
    }

    /// Total tiles the aggregate holds (natural tiles plus the wetland tile
    /// when present).
    pub fn tile_count(&self) -> usize {
        self.mu.len()
    }
}
