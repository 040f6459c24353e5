//! State stream codec abstraction
//!
//! The state file exists in two physically different encodings behind one
//! logical record schema: a length-delimited binary form and a
//! whitespace/line-delimited text form. This module is the only place that
//! knows the difference. Everything above it (locator, validator, decoders)
//! is written once against [`StateCodec`] and never branches on encoding.

mod binary;
mod errors;
mod text;

pub use binary::BinaryCodec;
pub use errors::{CodecError, CodecResult};
pub use text::TextCodec;

/// One cell record's header, read for every record during the scan and
/// retained only for the record that matches the requested cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRecordHeader {
    /// Grid cell id the record belongs to.
    pub cell_id: i32,
    /// Number of natural vegetation tiles in the record.
    pub tile_count: usize,
    /// Whether the record carries the synthetic wetland tile (and therefore
    /// a trailing lake block).
    pub has_wetland: bool,
    /// Number of snow bands in the record.
    pub band_count: usize,
    /// Payload byte length after the header; present in the binary encoding
    /// only (text records carry no explicit length).
    pub payload_len: Option<u64>,
}

impl CellRecordHeader {
    /// Total tiles the record carries: natural tiles plus the wetland tile.
    pub fn total_tiles(&self) -> usize {
        self.tile_count + usize::from(self.has_wetland)
    }
}

/// Primitive read operations over one state stream encoding.
///
/// Every primitive blocks until satisfied and fails with
/// [`CodecError::Truncated`] if the stream is exhausted mid-value. A stream
/// is consumed once per lookup; there are no retries at this level.
pub trait StateCodec {
    /// Repositions the stream at its start. Called once per lookup unless
    /// the caller guarantees ascending cell-id access order.
    fn rewind(&mut self) -> CodecResult<()>;

    /// Consumes the fixed file preamble (20 opaque bytes in binary, two
    /// header lines in text).
    fn skip_preamble(&mut self) -> CodecResult<()>;

    /// Reads one integer value.
    fn read_int(&mut self) -> CodecResult<i32>;

    /// Reads one double-precision value.
    fn read_double(&mut self) -> CodecResult<f64>;

    /// Reads one single-byte value (stored as an integer token in text).
    fn read_char(&mut self) -> CodecResult<u8>;

    /// Reads the next record header, or `None` when the stream ends cleanly
    /// at a record boundary.
    fn read_header(&mut self) -> CodecResult<Option<CellRecordHeader>>;

    /// Consumes exactly the remainder of one non-matching record, leaving
    /// the stream positioned at the next header. Binary skips the declared
    /// payload length byte-exactly; text re-derives the record's nested
    /// shape from the header and consumes it line by line without
    /// interpreting any value.
    fn skip_record(
        &mut self,
        header: &CellRecordHeader,
        lakes_enabled: bool,
    ) -> CodecResult<()>;
}

/// Validates raw header counts before they are trusted for skip arithmetic.
fn header_from_raw(
    cell_id: i32,
    tile_count: i32,
    extra_tile: i32,
    band_count: i32,
    payload_len: Option<i32>,
) -> CodecResult<CellRecordHeader> {
    if tile_count < 0 {
        return Err(CodecError::invalid_header("tile_count", tile_count.into()));
    }
    if !matches!(extra_tile, 0 | 1) {
        return Err(CodecError::invalid_header("extra_tile", extra_tile.into()));
    }
    if band_count < 0 {
        return Err(CodecError::invalid_header("band_count", band_count.into()));
    }
    let payload_len = match payload_len {
        Some(len) if len < 0 => {
            return Err(CodecError::invalid_header("payload_len", len.into()));
        }
        Some(len) => Some(len as u64),
        None => None,
    };
    Ok(CellRecordHeader {
        cell_id,
        tile_count: tile_count as usize,
        has_wetland: extra_tile == 1,
        band_count: band_count as usize,
        payload_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_tiles_counts_wetland() {
        let header = header_from_raw(5, 3, 1, 2, None).unwrap();
        assert_eq!(header.total_tiles(), 4);
        assert!(header.has_wetland);
    }

    #[test]
    fn test_negative_counts_rejected() {
        assert!(header_from_raw(5, -1, 0, 2, None).is_err());
        assert!(header_from_raw(5, 3, 0, -2, None).is_err());
        assert!(header_from_raw(5, 3, 2, 2, None).is_err());
        assert!(header_from_raw(5, 3, 0, 2, Some(-8)).is_err());
    }
}
