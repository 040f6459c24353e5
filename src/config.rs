//! Restart configuration and static parameters
//!
//! Every count and flag the restore needs is carried explicitly in
//! `RestoreConfig`, established once by the caller and threaded through the
//! decoders; nothing is read from process-wide state. The static soil and lake parameters come from the parameter-file
//! readers, which are external collaborators; this crate only consumes them
//! (and fills in the soil thermal profile arrays during a restore).

use serde::{Deserialize, Serialize};

/// State file encoding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Length-delimited binary records (little-endian).
    Binary,
    /// Whitespace/line-delimited text records.
    Text,
}

/// Caller-supplied restart configuration.
///
/// All counts describe the configuration the run was set up with; the
/// located record must agree with them before any payload is decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreConfig {
    /// State file encoding.
    pub encoding: Encoding,

    /// Number of vegetation tiles per cell (excluding the synthetic wetland
    /// tile that exists only when a lake is present).
    pub tile_count: usize,

    /// Number of elevation/snow bands per cell.
    pub band_count: usize,

    /// Number of soil layers.
    pub layer_count: usize,

    /// Number of soil thermal nodes.
    pub node_count: usize,

    /// Frost sub-area count when spatial frost is modeled. `None` means each
    /// soil layer stores a single scalar ice content.
    #[serde(default)]
    pub frost_subareas: Option<usize>,

    /// Whether the distributed-precipitation scheme is active (two
    /// wet/dry branches per tile/band instead of one).
    #[serde(default)]
    pub distributed_precip: bool,

    /// Whether the lake sub-model is compiled into the run at all. Lake
    /// coverage for the particular cell is carried by [`LakeParams`].
    #[serde(default)]
    pub lakes_enabled: bool,

    /// Rewind the stream and skip the file preamble before each lookup.
    /// Callers that disable this must request cells in ascending id order so
    /// each lookup resumes where the previous one stopped.
    #[serde(default = "default_rewind")]
    pub rewind: bool,
}

fn default_rewind() -> bool {
    true
}

impl RestoreConfig {
    /// Number of distributed-precipitation branches decoded per tile/band.
    pub fn branch_count(&self) -> usize {
        if self.distributed_precip {
            2
        } else {
            1
        }
    }

    /// Ice values stored per soil layer (1 unless spatial frost is modeled).
    pub fn ice_values_per_layer(&self) -> usize {
        self.frost_subareas.unwrap_or(1)
    }
}

/// Static soil parameters for the cell being restored.
///
/// `max_moist` and `area_fract` come from the soil parameter file and are
/// read-only inputs. The thermal profile arrays and the damping depth are
/// mutated by the restore: the profile is read from the state file, and the
/// damping depth is widened when the stored profile extends below it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilParams {
    /// Maximum moisture capacity per soil layer (mm).
    pub max_moist: Vec<f64>,

    /// Area fraction per snow band. Bands with a non-positive fraction carry
    /// no data in the state file and are skipped entirely.
    pub area_fract: Vec<f64>,

    /// Soil damping depth (m).
    pub damping_depth: f64,

    /// Thermal node spacing (m), filled by the restore.
    #[serde(default)]
    pub dz_node: Vec<f64>,

    /// Cumulative thermal node depth (m), filled by the restore.
    #[serde(default)]
    pub zsum_node: Vec<f64>,
}

/// Static lake parameters for the cell being restored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LakeParams {
    /// Lake coverage fraction for this cell. Zero means the cell has no
    /// lake even when the lake sub-model is enabled.
    pub coverage: f64,

    /// Number of lake nodes in the lake parameter file; the count stored in
    /// the state file must agree.
    pub node_count: usize,
}

impl LakeParams {
    /// Parameters for a cell with no lake.
    pub fn none() -> Self {
        Self {
            coverage: 0.0,
            node_count: 0,
        }
    }

    /// Whether this cell carries a lake (and therefore a wetland tile).
    pub fn has_lake(&self) -> bool {
        self.coverage > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> RestoreConfig {
        RestoreConfig {
            encoding: Encoding::Binary,
            tile_count: 3,
            band_count: 2,
            layer_count: 3,
            node_count: 5,
            frost_subareas: None,
            distributed_precip: false,
            lakes_enabled: false,
            rewind: true,
        }
    }

    #[test]
    fn test_branch_count() {
        let mut config = sample_config();
        assert_eq!(config.branch_count(), 1);
        config.distributed_precip = true;
        assert_eq!(config.branch_count(), 2);
    }

    #[test]
    fn test_ice_values_per_layer() {
        let mut config = sample_config();
        assert_eq!(config.ice_values_per_layer(), 1);
        config.frost_subareas = Some(3);
        assert_eq!(config.ice_values_per_layer(), 3);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = sample_config();
        let json = serde_json::to_string(&config).unwrap();
        let back: RestoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tile_count, 3);
        assert_eq!(back.encoding, Encoding::Binary);
        assert!(back.rewind);
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let json = r#"{
            "encoding": "text",
            "tile_count": 1,
            "band_count": 1,
            "layer_count": 2,
            "node_count": 3
        }"#;
        let config: RestoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.encoding, Encoding::Text);
        assert!(config.rewind, "rewind defaults on");
        assert!(config.frost_subareas.is_none());
        assert!(!config.distributed_precip);
        assert!(!config.lakes_enabled);
    }

    #[test]
    fn test_lake_params_none() {
        let lake = LakeParams::none();
        assert!(!lake.has_lake());
        assert_eq!(lake.node_count, 0);
    }
}
