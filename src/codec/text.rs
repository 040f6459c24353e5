//! Text state stream codec
//!
//! Values are whitespace-delimited ASCII tokens; records are laid out one
//! line per logical sub-block (one storm line per tile, one line per band,
//! one trailing lake line). Single-byte values are stored as integer tokens.
//! Text records carry no explicit length, so skipping a non-matching record
//! re-derives the record's nested shape from its header and consumes it line
//! by line without interpreting any field.

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::str::FromStr;

use super::errors::{CodecError, CodecResult};
use super::{header_from_raw, CellRecordHeader, StateCodec};

/// Reader for the text state file encoding.
pub struct TextCodec<R: Read + Seek> {
    reader: BufReader<R>,
}

impl<R: Read + Seek> TextCodec<R> {
    /// Wraps an open text state stream.
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Returns the next whitespace-delimited token, or `None` when the
    /// stream is exhausted before any token starts.
    fn next_token(&mut self) -> CodecResult<Option<String>> {
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }
            match buf.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(start) => {
                    self.reader.consume(start);
                    break;
                }
                None => {
                    let len = buf.len();
                    self.reader.consume(len);
                }
            }
        }

        let mut token = Vec::new();
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            match buf.iter().position(|b| b.is_ascii_whitespace()) {
                Some(end) => {
                    token.extend_from_slice(&buf[..end]);
                    self.reader.consume(end);
                    break;
                }
                None => {
                    token.extend_from_slice(buf);
                    let len = buf.len();
                    self.reader.consume(len);
                }
            }
        }

        String::from_utf8(token)
            .map(Some)
            .map_err(|e| CodecError::malformed(String::from_utf8_lossy(e.as_bytes()), "ASCII token"))
    }

    fn required_token(&mut self) -> CodecResult<String> {
        self.next_token()?.ok_or(CodecError::Truncated)
    }

    fn read_value<T: FromStr>(&mut self, expected: &'static str) -> CodecResult<T> {
        let token = self.required_token()?;
        token
            .parse()
            .map_err(|_| CodecError::malformed(token, expected))
    }

    /// Consumes through the next newline (or the final unterminated line).
    fn skip_line(&mut self) -> CodecResult<()> {
        let mut discard = Vec::new();
        let consumed = self.reader.read_until(b'\n', &mut discard)?;
        if consumed == 0 {
            return Err(CodecError::Truncated);
        }
        Ok(())
    }
}

impl<R: Read + Seek> StateCodec for TextCodec<R> {
    fn rewind(&mut self) -> CodecResult<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn skip_preamble(&mut self) -> CodecResult<()> {
        self.skip_line()?;
        self.skip_line()
    }

    fn read_int(&mut self) -> CodecResult<i32> {
        self.read_value("integer")
    }

    fn read_double(&mut self) -> CodecResult<f64> {
        self.read_value("floating-point value")
    }

    fn read_char(&mut self) -> CodecResult<u8> {
        // Single-byte fields are written as integer tokens in text.
        Ok(self.read_int()? as u8)
    }

    fn read_header(&mut self) -> CodecResult<Option<CellRecordHeader>> {
        let first = match self.next_token()? {
            Some(token) => token,
            None => return Ok(None),
        };
        let cell_id = first
            .parse()
            .map_err(|_| CodecError::malformed(first, "integer"))?;
        let tile_count = self.read_int()?;
        let extra_tile = self.read_int()?;
        let band_count = self.read_int()?;
        header_from_raw(cell_id, tile_count, extra_tile, band_count, None).map(Some)
    }

    fn skip_record(
        &mut self,
        header: &CellRecordHeader,
        lakes_enabled: bool,
    ) -> CodecResult<()> {
        // Finish the partially consumed header line first.
        self.skip_line()?;
        for tile in 0..header.total_tiles() {
            // Storm record line for the tile.
            self.skip_line()?;
            // The wetland tile occurs in band 0 only.
            let bands = if lakes_enabled && header.has_wetland && tile == header.tile_count {
                1
            } else {
                header.band_count
            };
            for _ in 0..bands {
                self.skip_line()?;
            }
        }
        if lakes_enabled && header.has_wetland {
            self.skip_line()?;
        }
        Ok(())
    }
}
