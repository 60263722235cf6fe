use bytes::{Bytes, BytesMut};

use super::{SeriesConfig, SeriesState};
use crate::compression::bits::BitWriter;
use crate::compression::time::{write_end_of_stream, TimeCompressor};
use crate::compression::value::ValueCompressor;
use crate::compression::Compressor;
use crate::error::*;

/// Width of the block header holding `t0`.
pub const HEADER_BITS: u32 = 32;

///
/// Unsynchronised encoder state machine behind a [`super::Series`]. The block header is
/// written on creation, every push appends one sample, `finish` appends the end of stream
/// record.
///
/// Timestamp 0 marks "no point written yet", so the first pushed timestamp must not be 0.
#[derive(Debug, Clone)]
pub struct SeriesEncoder {
    time: TimeCompressor,
    value: ValueCompressor,
    writer: BitWriter,
    finished: bool,
}

impl SeriesEncoder {
    pub fn new(t0: u32, config: &SeriesConfig) -> Self {
        let mut writer = BitWriter::with_capacity(config.initial_capacity);
        writer.write_bits(t0 as u64, HEADER_BITS);
        Self {
            time: TimeCompressor::new(t0),
            value: ValueCompressor::default(),
            writer,
            finished: false,
        }
    }

    pub fn t0(&self) -> u32 {
        self.time.t0
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn push(&mut self, t: u32, v: f64) {
        if self.finished {
            log::warn!("Dropping point pushed after finish [t0={}, t={}]", self.time.t0, t);
            return;
        }
        if self.time.is_empty() {
            self.time.compress_first(&mut self.writer, t);
            self.value.compress_first(&mut self.writer, v);
        } else {
            self.time.compress(&mut self.writer, t);
            self.value.compress(&mut self.writer, v);
        }
    }

    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        write_end_of_stream(&mut self.writer);
        self.finished = true;
        log::debug!(
            "Finished series [t0={}, bytes={}]",
            self.time.t0,
            self.writer.as_slice().len()
        );
    }

    pub fn bytes(&self) -> Bytes {
        self.writer.bytes()
    }

    pub fn len_bits(&self) -> usize {
        self.writer.len_bits()
    }

    ///
    /// Copy of the bit stream and whether it already ends with the end of stream record.
    pub fn snapshot(&self) -> (BitWriter, bool) {
        (self.writer.clone(), self.finished)
    }

    pub fn state(&self) -> SeriesState {
        let (leading, trailing) = SeriesState::window_fields(self.value.window);
        SeriesState {
            t0: self.time.t0,
            t: self.time.t,
            t_delta: self.time.t_delta,
            val: self.value.val,
            leading,
            trailing,
            buf: self.writer.bytes(),
            pending_bits: self.writer.pending_bits(),
            finished: self.finished,
        }
    }

    pub fn from_state(state: SeriesState) -> Result<Self> {
        let window = state.validate()?;
        Ok(Self {
            time: TimeCompressor {
                t0: state.t0,
                t: state.t,
                t_delta: state.t_delta,
            },
            value: ValueCompressor {
                val: state.val,
                window,
            },
            writer: BitWriter::resume(BytesMut::from(&state.buf[..]), state.pending_bits),
            finished: state.finished,
        })
    }
}
