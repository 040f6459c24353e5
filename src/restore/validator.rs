//! Record schema validation
//!
//! Structural agreement between the located record and the caller's restart
//! configuration is established before any payload value is trusted. All
//! four checks run up front; any disagreement is fatal, because decoding a
//! record shaped differently from the configuration would silently
//! misassign every subsequent value.

use crate::codec::CellRecordHeader;
use crate::config::{LakeParams, RestoreConfig};

use super::errors::{StateError, StateResult};

/// Validates the located record header against the restart configuration.
pub fn validate_header(
    header: &CellRecordHeader,
    config: &RestoreConfig,
    lake: &LakeParams,
) -> StateResult<()> {
    if header.tile_count != config.tile_count {
        return Err(StateError::tile_count_mismatch(
            header.cell_id,
            header.tile_count,
            config.tile_count,
        ));
    }
    if header.band_count != config.band_count {
        return Err(StateError::band_count_mismatch(
            header.cell_id,
            header.band_count,
            config.band_count,
        ));
    }
    let has_lake = config.lakes_enabled && lake.has_lake();
    if has_lake && !header.has_wetland {
        return Err(StateError::lake_not_listed(header.cell_id));
    }
    if !has_lake && header.has_wetland {
        // The wetland flag adds a tile the aggregate was not allocated for;
        // decoding it would misindex everything that follows.
        return Err(StateError::lake_unexpected(header.cell_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Encoding;
    use crate::restore::errors::StateErrorCode;

    fn config(lakes: bool) -> RestoreConfig {
        RestoreConfig {
            encoding: Encoding::Binary,
            tile_count: 3,
            band_count: 2,
            layer_count: 3,
            node_count: 5,
            frost_subareas: None,
            distributed_precip: false,
            lakes_enabled: lakes,
            rewind: true,
        }
    }

    fn header(tiles: usize, wetland: bool, bands: usize) -> CellRecordHeader {
        CellRecordHeader {
            cell_id: 5,
            tile_count: tiles,
            has_wetland: wetland,
            band_count: bands,
            payload_len: None,
        }
    }

    #[test]
    fn test_matching_header_passes() {
        let result = validate_header(&header(3, false, 2), &config(false), &LakeParams::none());
        assert!(result.is_ok());
    }

    #[test]
    fn test_tile_count_mismatch() {
        let err = validate_header(&header(4, false, 2), &config(false), &LakeParams::none())
            .unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateTileCountMismatch);
        assert!(err.message().contains("(4)"));
        assert!(err.message().contains("(3)"));
    }

    #[test]
    fn test_band_count_mismatch_names_both_values() {
        let err = validate_header(&header(3, false, 3), &config(false), &LakeParams::none())
            .unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateBandCountMismatch);
        assert!(err.message().contains("(3)"));
        assert!(err.message().contains("(2)"));
    }

    #[test]
    fn test_lake_configured_but_not_listed() {
        let lake = LakeParams {
            coverage: 0.2,
            node_count: 4,
        };
        let err = validate_header(&header(3, false, 2), &config(true), &lake).unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateLakeFlagMismatch);
        assert!(err.message().contains("does not list a lake"));
    }

    #[test]
    fn test_lake_listed_but_not_configured() {
        let err = validate_header(&header(3, true, 2), &config(true), &LakeParams::none())
            .unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateLakeFlagMismatch);
        assert!(err.message().contains("lists a lake"));
    }

    #[test]
    fn test_wetland_flag_fatal_when_lake_model_disabled() {
        // The record carries a wetland tile the run has no lake for; letting
        // it through would decode one tile more than the aggregate holds.
        let err = validate_header(&header(3, true, 2), &config(false), &LakeParams::none())
            .unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateLakeFlagMismatch);
        assert!(err.message().contains("lists a lake"));
    }
}
