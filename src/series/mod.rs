use std::io::{Read, Write};

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;

use crate::compression::time::write_end_of_stream;
use crate::error::*;

mod encoder;
#[cfg(test)]
pub(crate) mod fixtures;
mod iter;
mod state;

pub use encoder::{SeriesEncoder, HEADER_BITS};
pub use iter::SeriesIter;
pub use state::{SeriesState, UNSET_LEADING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub t: u32,
    pub v: f64,
}

#[derive(Debug, Clone)]
pub struct SeriesConfig {
    /// Bytes reserved up front for the bit stream.
    pub initial_capacity: usize,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
        }
    }
}

///
/// A compressed block of (timestamp, value) samples that can be appended to and read from
/// concurrently. Every operation takes the lock only for the in memory copy or mutation;
/// iterators decode a snapshot without holding it.
///
/// Timestamps must be pushed in increasing order and the first one must not be 0.
#[derive(Debug)]
pub struct Series {
    inner: Mutex<SeriesEncoder>,
}

impl Series {
    pub fn new(t0: u32) -> Self {
        Self::with_config(t0, &SeriesConfig::default())
    }

    pub fn with_config(t0: u32, config: &SeriesConfig) -> Self {
        Self {
            inner: Mutex::new(SeriesEncoder::new(t0, config)),
        }
    }

    pub fn from_state(state: SeriesState) -> Result<Self> {
        let encoder = SeriesEncoder::from_state(state)?;
        log::debug!(
            "Restored series [t0={}, bits={}, finished={}]",
            encoder.t0(),
            encoder.len_bits(),
            encoder.is_finished()
        );
        Ok(Self {
            inner: Mutex::new(encoder),
        })
    }

    pub fn t0(&self) -> u32 {
        self.inner.lock().t0()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.lock().is_finished()
    }

    pub fn push(&self, t: u32, v: f64) {
        self.inner.lock().push(t, v)
    }

    ///
    /// Appends the end of stream record, further calls are no-ops.
    pub fn finish(&self) {
        self.inner.lock().finish()
    }

    ///
    /// Raw bytes written so far. Only decodable on its own once the series is finished.
    pub fn bytes(&self) -> Bytes {
        self.inner.lock().bytes()
    }

    ///
    /// Point in time iterator, later pushes are not visible to it.
    pub fn iter(&self) -> SeriesIter {
        // guard is released at the end of this statement
        let (mut writer, finished) = self.inner.lock().snapshot();
        if !finished {
            write_end_of_stream(&mut writer);
        }
        SeriesIter::from_snapshot(writer.freeze())
    }

    pub fn state(&self) -> SeriesState {
        self.inner.lock().state()
    }

    pub fn save<W: Write>(&self, w: &mut W) -> Result<()> {
        let state = self.state();
        let mut buf = BytesMut::new();
        state.encode(&mut buf);
        w.write_all(&buf)?;
        w.flush()?;
        log::debug!("Saved series [t0={}, bytes={}]", state.t0, buf.len());
        Ok(())
    }

    pub fn load<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = Vec::new();
        r.read_to_end(&mut buf)?;
        Self::from_state(SeriesState::decode(&buf)?)
    }
}
