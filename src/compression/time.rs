// Time compressor uses the "delta of delta" ideas from Facebooks Gorrila paper
// https://www.vldb.org/pvldb/vol8/p1816-teller.pdf
use super::bits::{BitReader, BitWriter};
use super::{Compressor, Decompressor};
use crate::error::*;

/// Width of the first delta, caps the first interval at 16383.
pub const FIRST_DELTA_BITS: u32 = 14;

// Range masks (4.1.1)
// (prefix, prefix bits, payload bits, min, max)
const MAX_PREFIX_BITS: u32 = 4;
const R1: (u64, u32, u32, i32, i32) = (0b10, 2, 7, -63, 64);
const R2: (u64, u32, u32, i32, i32) = (0b110, 3, 9, -255, 256);
const R3: (u64, u32, u32, i32, i32) = (0b1110, MAX_PREFIX_BITS, 12, -2047, 2048);
const R4: (u64, u32, u32, i32, i32) = (0b1111, MAX_PREFIX_BITS, 32, i32::MIN, i32::MAX);

const RANGES: [(u64, u32, u32, i32, i32); 4] = [R1, R2, R3, R4];

/// Payload of the R4 range marking the end of a stream. As an i32 it is -1, which always
/// takes R1, so no real delta of delta can collide with it.
const END_OF_STREAM: u64 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOfDelta {
    Delta(i32),
    EndOfStream,
}

///
/// Turns the low `bits` of `payload` back into a signed delta. Payloads strictly above
/// half the range are negative, so +64 survives in 7 bits while -64 does not.
fn sign_extend(payload: u64, bits: u32) -> i32 {
    if payload > 1 << (bits - 1) {
        (payload as i64 - (1i64 << bits)) as i32
    } else {
        payload as i32
    }
}

pub fn write_dod(w: &mut BitWriter, dod: i32) {
    if dod == 0 {
        w.off();
        return;
    }
    for (prefix, prefix_bits, payload_bits, min, max) in RANGES {
        if min <= dod && dod <= max {
            w.write_bits(prefix, prefix_bits);
            w.write_bits(dod as u32 as u64, payload_bits);
            return;
        }
    }
}

pub fn write_end_of_stream(w: &mut BitWriter) {
    let (prefix, prefix_bits, payload_bits, _, _) = R4;
    w.write_bits(prefix, prefix_bits);
    w.write_bits(END_OF_STREAM, payload_bits);
    w.pad_to_byte();
}

pub fn read_dod(r: &mut BitReader) -> Result<DeltaOfDelta> {
    let mut prefix = 0u64;
    for _ in 0..MAX_PREFIX_BITS {
        prefix <<= 1;
        if !r.read_bit()? {
            break;
        }
        prefix |= 1;
    }
    if prefix == 0 {
        return Ok(DeltaOfDelta::Delta(0));
    }
    for (range_prefix, _, payload_bits, _, _) in RANGES {
        if prefix != range_prefix {
            continue;
        }
        let payload = r.read_bits(payload_bits)?;
        if range_prefix == R4.0 && payload == END_OF_STREAM {
            return Ok(DeltaOfDelta::EndOfStream);
        }
        return Ok(DeltaOfDelta::Delta(sign_extend(payload, payload_bits)));
    }
    // the prefix loop can only stop on a zero bit or after four ones
    Err(Error::Corrupt(format!("unknown delta of delta prefix {:#b}", prefix)))
}

///
/// Encoder side timestamp state. `t == 0` means no point has been written yet.
#[derive(Debug, Clone, Default)]
pub struct TimeCompressor {
    pub t0: u32,
    pub t: u32,
    pub t_delta: u32,
}

impl TimeCompressor {
    pub fn new(t0: u32) -> Self {
        Self {
            t0,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.t == 0
    }
}

impl Compressor<u32> for TimeCompressor {
    fn compress_first(&mut self, w: &mut BitWriter, t: u32) {
        self.t_delta = t.wrapping_sub(self.t0);
        self.t = t;
        w.write_bits(self.t_delta as u64, FIRST_DELTA_BITS);
    }

    fn compress(&mut self, w: &mut BitWriter, t: u32) {
        let t_delta = t.wrapping_sub(self.t);
        let dod = t_delta.wrapping_sub(self.t_delta) as i32;
        write_dod(w, dod);
        self.t_delta = t_delta;
        self.t = t;
    }
}

///
/// Decoder side timestamp state, yields `None` once the end of stream record is read.
#[derive(Debug, Clone, Default)]
pub struct TimeDecompressor {
    pub t0: u32,
    pub t: u32,
    pub t_delta: u32,
}

impl TimeDecompressor {
    pub fn new(t0: u32) -> Self {
        Self {
            t0,
            ..Default::default()
        }
    }
}

impl Decompressor<Option<u32>> for TimeDecompressor {
    fn decompress_first(&mut self, r: &mut BitReader) -> Result<Option<u32>> {
        self.t_delta = r.read_bits(FIRST_DELTA_BITS)? as u32;
        self.t = self.t0.wrapping_add(self.t_delta);
        Ok(Some(self.t))
    }

    fn decompress(&mut self, r: &mut BitReader) -> Result<Option<u32>> {
        match read_dod(r)? {
            DeltaOfDelta::EndOfStream => Ok(None),
            DeltaOfDelta::Delta(dod) => {
                self.t_delta = self.t_delta.wrapping_add(dod as u32);
                self.t = self.t.wrapping_add(self.t_delta);
                Ok(Some(self.t))
            }
        }
    }
}
