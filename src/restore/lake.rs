//! Lake state decoder
//!
//! Decoded once per cell, after every tile/band block, and only when the
//! cell has a configured lake. The per-node arrays are sized by the active
//! node count stored at the front of the block; the caller-allocated arrays
//! are bounds-checked against it because the containers are no longer
//! fixed-size. The redeclared lake node count near the end of the block is
//! validated against the lake parameter file for both encodings.

use crate::codec::StateCodec;
use crate::config::LakeParams;
use crate::state::LakeState;

use super::errors::{StateError, StateResult};

/// Decodes the lake block into the caller-allocated lake state.
pub(crate) fn decode_lake<C: StateCodec>(
    codec: &mut C,
    params: &LakeParams,
    lake: &mut LakeState,
) -> StateResult<()> {
    let active = codec.read_int()?;
    if active < 0 || active as usize > lake.temp.len() {
        return Err(StateError::lake_active_overflow(
            active.into(),
            lake.temp.len(),
        ));
    }
    let active = active as usize;
    lake.active_nodes = active;

    lake.volume = codec.read_double()?;
    lake.depth = codec.read_double()?;
    lake.surface_area = codec.read_double()?;
    lake.dz = codec.read_double()?;
    lake.surf_dz = codec.read_double()?;

    for node in 0..active {
        lake.surface[node] = codec.read_double()?;
    }

    lake.inflow_temp = codec.read_double()?;
    lake.avg_temp = codec.read_double()?;

    for node in 0..active {
        lake.temp[node] = codec.read_double()?;
    }
    for node in 0..active {
        lake.density[node] = codec.read_double()?;
    }

    lake.mix_max = codec.read_int()?;

    let stored_nodes = codec.read_int()?;
    if stored_nodes as i64 != params.node_count as i64 {
        return Err(StateError::lake_node_mismatch(
            stored_nodes.into(),
            params.node_count,
        ));
    }

    lake.ice_temp = codec.read_double()?;
    lake.ice_height = codec.read_double()?;
    lake.ice_fraction = codec.read_double()?;
    lake.snow_swe = codec.read_double()?;
    lake.snow_depth = codec.read_double()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BinaryCodec;
    use crate::restore::errors::StateErrorCode;
    use std::io::Cursor;

    fn lake_block(active: i32, node_count: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        let int = |buf: &mut Vec<u8>, v: i32| buf.extend_from_slice(&v.to_le_bytes());
        let dbl = |buf: &mut Vec<u8>, v: f64| buf.extend_from_slice(&v.to_le_bytes());

        int(&mut buf, active);
        dbl(&mut buf, 1.0e6); // volume
        dbl(&mut buf, 12.5); // depth
        dbl(&mut buf, 8.0e4); // surface area
        dbl(&mut buf, 0.5); // dz
        dbl(&mut buf, 0.1); // surfdz
        for node in 0..active {
            dbl(&mut buf, 1000.0 * f64::from(node + 1)); // surface[]
        }
        dbl(&mut buf, 4.0); // inflow temp
        dbl(&mut buf, 6.5); // average temp
        for node in 0..active {
            dbl(&mut buf, 5.0 + f64::from(node)); // temp[]
        }
        for node in 0..active {
            dbl(&mut buf, 999.0 + f64::from(node)); // density[]
        }
        int(&mut buf, 3); // mixmax
        int(&mut buf, node_count); // redeclared node count
        dbl(&mut buf, -2.0); // ice temp
        dbl(&mut buf, 0.3); // ice thickness
        dbl(&mut buf, 0.4); // ice fraction
        dbl(&mut buf, 0.05); // swe on ice
        dbl(&mut buf, 0.2); // snow depth on ice
        buf
    }

    fn params() -> LakeParams {
        LakeParams {
            coverage: 0.2,
            node_count: 5,
        }
    }

    #[test]
    fn test_lake_block_decodes_in_order() {
        let mut codec = BinaryCodec::new(Cursor::new(lake_block(3, 5)));
        let mut lake = LakeState::new(5);
        decode_lake(&mut codec, &params(), &mut lake).unwrap();

        assert_eq!(lake.active_nodes, 3);
        assert_eq!(lake.volume, 1.0e6);
        assert_eq!(lake.depth, 12.5);
        assert_eq!(lake.surface[..3], [1000.0, 2000.0, 3000.0]);
        assert_eq!(lake.surface[3..], [0.0, 0.0], "inactive nodes untouched");
        assert_eq!(lake.temp[..3], [5.0, 6.0, 7.0]);
        assert_eq!(lake.density[2], 1001.0);
        assert_eq!(lake.mix_max, 3);
        assert_eq!(lake.ice_fraction, 0.4);
        assert_eq!(lake.snow_depth, 0.2);
    }

    #[test]
    fn test_node_count_mismatch_is_fatal() {
        let mut codec = BinaryCodec::new(Cursor::new(lake_block(3, 7)));
        let mut lake = LakeState::new(5);
        let err = decode_lake(&mut codec, &params(), &mut lake).unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateLakeNodeMismatch);
        assert!(err.message().contains("(7)"));
        assert!(err.message().contains("(5)"));
    }

    #[test]
    fn test_active_nodes_beyond_allocation_is_fatal() {
        let mut codec = BinaryCodec::new(Cursor::new(lake_block(6, 5)));
        let mut lake = LakeState::new(5);
        let err = decode_lake(&mut codec, &params(), &mut lake).unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateLakeNodeMismatch);
        assert!(err.message().contains("exceeds"));
    }

    #[test]
    fn test_truncated_lake_block_is_fatal() {
        let block = lake_block(3, 5);
        let mut codec = BinaryCodec::new(Cursor::new(block[..40].to_vec()));
        let mut lake = LakeState::new(5);
        let err = decode_lake(&mut codec, &params(), &mut lake).unwrap_err();
        assert_eq!(err.code(), StateErrorCode::StateTruncated);
    }
}
