use bytes::Bytes;

use super::{Point, HEADER_BITS};
use crate::compression::bits::BitReader;
use crate::compression::time::TimeDecompressor;
use crate::compression::value::ValueDecompressor;
use crate::compression::Decompressor;
use crate::error::*;

#[derive(Debug)]
enum IterState {
    Empty,
    Streaming,
    Exhausted,
    Errored(Error),
}

///
/// Pull based decoder over one series block. Exhausted (end of stream record read) and
/// Errored are terminal.
///
/// ```text
///   Empty --advance--> Streaming --advance--> Streaming
///     |                    |---end of stream--> Exhausted
///     '----read error------'---read error-----> Errored
/// ```
#[derive(Debug)]
pub struct SeriesIter {
    reader: BitReader,
    time: TimeDecompressor,
    value: ValueDecompressor,
    state: IterState,
    count: usize,
}

impl SeriesIter {
    ///
    /// Decoder over raw series bytes, fails when the block header is missing.
    pub fn new(buf: Bytes) -> Result<Self> {
        Self::open(BitReader::from(buf))
    }

    pub(crate) fn from_snapshot(reader: BitReader) -> Self {
        Self::open(reader).unwrap_or_else(|e| Self {
            reader: BitReader::from(Bytes::new()),
            time: TimeDecompressor::default(),
            value: ValueDecompressor::default(),
            state: IterState::Errored(e),
            count: 0,
        })
    }

    fn open(mut reader: BitReader) -> Result<Self> {
        let t0 = reader.read_bits(HEADER_BITS)? as u32;
        Ok(Self {
            reader,
            time: TimeDecompressor::new(t0),
            value: ValueDecompressor::default(),
            state: IterState::Empty,
            count: 0,
        })
    }

    pub fn t0(&self) -> u32 {
        self.time.t0
    }

    ///
    /// Decodes the next point. False once the stream ended or failed, see [`Self::error`].
    pub fn advance(&mut self) -> bool {
        let next = match self.state {
            IterState::Exhausted | IterState::Errored(_) => return false,
            IterState::Empty => self.read_first(),
            IterState::Streaming => self.read_next(),
        };
        match next {
            Ok(true) => {
                self.state = IterState::Streaming;
                self.count += 1;
                true
            }
            Ok(false) => {
                self.state = IterState::Exhausted;
                false
            }
            Err(e) => {
                if self.count == 0 && e.is_end_of_data() {
                    log::debug!("No points in series [t0={}]", self.time.t0);
                } else {
                    log::warn!(
                        "Decode stopped [t0={}, points={}]: {}",
                        self.time.t0,
                        self.count,
                        e
                    );
                }
                self.state = IterState::Errored(e);
                false
            }
        }
    }

    fn read_first(&mut self) -> Result<bool> {
        self.time.decompress_first(&mut self.reader)?;
        self.value.decompress_first(&mut self.reader)?;
        Ok(true)
    }

    fn read_next(&mut self) -> Result<bool> {
        if self.time.decompress(&mut self.reader)?.is_none() {
            return Ok(false);
        }
        self.value.decompress(&mut self.reader)?;
        Ok(true)
    }

    pub fn current(&self) -> (u32, f64) {
        (self.time.t, f64::from_bits(self.value.val))
    }

    pub fn error(&self) -> Option<&Error> {
        match &self.state {
            IterState::Errored(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, IterState::Exhausted)
    }
}

impl Iterator for SeriesIter {
    type Item = Point;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            let (t, v) = self.current();
            Some(Point { t, v })
        } else {
            None
        }
    }
}
