//! Record locator
//!
//! State files are an unordered sequence of variable-length cell records
//! with no index, so the only way to find a cell is a linear scan: read each
//! header, and on a cell-id mismatch skip exactly the remainder of that
//! record before reading the next header. The scan is a three-state machine,
//! SEARCHING until a header matches (FOUND) or the stream ends at a record
//! boundary (EXHAUSTED, always fatal: the file does not contain the cell).

use crate::codec::{CellRecordHeader, StateCodec};
use crate::config::RestoreConfig;

use super::errors::{StateError, StateResult};

/// Scans the stream for the record belonging to `target_cell`.
///
/// When the configuration enables rewinding, the stream is repositioned at
/// its start and the file preamble is consumed before the scan; otherwise
/// the scan resumes from the current position, which requires the caller to
/// look cells up in ascending id order.
pub fn locate_cell<C: StateCodec>(
    codec: &mut C,
    target_cell: i32,
    config: &RestoreConfig,
) -> StateResult<CellRecordHeader> {
    if config.rewind {
        codec.rewind()?;
        codec.skip_preamble()?;
    }

    loop {
        let header = match codec.read_header()? {
            Some(header) => header,
            None => return Err(StateError::cell_not_found(target_cell)),
        };
        if header.cell_id == target_cell {
            return Ok(header);
        }
        codec.skip_record(&header, config.lakes_enabled)?;
    }
}
