//! Binary state stream codec
//!
//! Values are stored little-endian: integers as 4 bytes, doubles as 8-byte
//! IEEE-754, single-byte values as one raw byte. Each record header carries
//! an explicit payload byte length, so skipping a non-matching record is a
//! byte-exact skip with no knowledge of the record's nested shape.

use std::io::{self, BufReader, Read, Seek, SeekFrom};

use super::errors::{CodecError, CodecResult};
use super::{header_from_raw, CellRecordHeader, StateCodec};

/// Opaque bytes before the first record (the writer's five-int file header).
const PREAMBLE_BYTES: u64 = 20;

/// Reader for the binary state file encoding.
pub struct BinaryCodec<R: Read + Seek> {
    reader: BufReader<R>,
}

impl<R: Read + Seek> BinaryCodec<R> {
    /// Wraps an open binary state stream.
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Fills `buf` completely, or fails with `Truncated` if the stream ends
    /// first (whether at the first byte or mid-value).
    fn read_exact_or_truncated(&mut self, buf: &mut [u8]) -> CodecResult<()> {
        match self.try_read_exact(buf)? {
            true => Ok(()),
            false => Err(CodecError::Truncated),
        }
    }

    /// Fills `buf` completely. Returns `Ok(false)` when the stream is
    /// already exhausted before the first byte (a clean record boundary);
    /// a partial fill is `Truncated`.
    fn try_read_exact(&mut self, buf: &mut [u8]) -> CodecResult<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => return Err(CodecError::Truncated),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }

    fn skip_bytes(&mut self, count: u64) -> CodecResult<()> {
        let copied = io::copy(&mut self.reader.by_ref().take(count), &mut io::sink())?;
        if copied != count {
            return Err(CodecError::Truncated);
        }
        Ok(())
    }
}

impl<R: Read + Seek> StateCodec for BinaryCodec<R> {
    fn rewind(&mut self) -> CodecResult<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn skip_preamble(&mut self) -> CodecResult<()> {
        self.skip_bytes(PREAMBLE_BYTES)
    }

    fn read_int(&mut self) -> CodecResult<i32> {
        let mut buf = [0u8; 4];
        self.read_exact_or_truncated(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_double(&mut self) -> CodecResult<f64> {
        let mut buf = [0u8; 8];
        self.read_exact_or_truncated(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn read_char(&mut self) -> CodecResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact_or_truncated(&mut buf)?;
        Ok(buf[0])
    }

    fn read_header(&mut self) -> CodecResult<Option<CellRecordHeader>> {
        // A clean end of stream may only fall on the first header field.
        let mut first = [0u8; 4];
        if !self.try_read_exact(&mut first)? {
            return Ok(None);
        }
        let cell_id = i32::from_le_bytes(first);
        let tile_count = self.read_int()?;
        let extra_tile = self.read_int()?;
        let band_count = self.read_int()?;
        let payload_len = self.read_int()?;
        header_from_raw(cell_id, tile_count, extra_tile, band_count, Some(payload_len))
            .map(Some)
    }

    fn skip_record(
        &mut self,
        header: &CellRecordHeader,
        _lakes_enabled: bool,
    ) -> CodecResult<()> {
        // Binary records declare their own length; the nested shape is
        // irrelevant here.
        let len = header
            .payload_len
            .ok_or_else(|| CodecError::invalid_header("payload_len", -1))?;
        self.skip_bytes(len)
    }
}
