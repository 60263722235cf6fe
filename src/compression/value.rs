// Value compressor XORs each value with its predecessor (Gorilla paper 4.1.2), only the
// meaningful bits of the XOR are stored.
use super::bits::{BitReader, BitWriter};
use super::{Compressor, Decompressor};
use crate::error::*;

const LEADING_BITS: u32 = 5;
const SIGNIFICANT_BITS: u32 = 6;
/// Largest leading zero count that fits `LEADING_BITS`.
const MAX_LEADING: u32 = 31;

///
/// Span of significant bits of the last non zero XOR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XorWindow {
    pub leading: u32,
    pub trailing: u32,
}

impl XorWindow {
    pub fn significant(&self) -> u32 {
        64 - self.leading - self.trailing
    }

    fn contains(&self, leading: u32, trailing: u32) -> bool {
        leading >= self.leading && trailing >= self.trailing
    }
}

///
/// Encoder side value state. `window` is `None` until the first non zero XOR.
#[derive(Debug, Clone, Default)]
pub struct ValueCompressor {
    pub val: u64,
    pub window: Option<XorWindow>,
}

impl Compressor<f64> for ValueCompressor {
    fn compress_first(&mut self, w: &mut BitWriter, v: f64) {
        self.val = v.to_bits();
        w.write_bits(self.val, 64);
    }

    fn compress(&mut self, w: &mut BitWriter, v: f64) {
        let bits = v.to_bits();
        let xor = bits ^ self.val;
        self.val = bits;

        if xor == 0 {
            w.off();
            return;
        }
        w.on();

        let leading = xor.leading_zeros().min(MAX_LEADING);
        let trailing = xor.trailing_zeros();

        match self.window {
            Some(window) if window.contains(leading, trailing) => {
                w.off();
                w.write_bits(xor >> window.trailing, window.significant());
            }
            _ => {
                let window = XorWindow { leading, trailing };
                let significant = window.significant();
                w.on();
                w.write_bits(leading as u64, LEADING_BITS);
                // 64 significant bits does not fit in 6 bits, it is written as 0 which a
                // non zero XOR can never produce.
                w.write_bits((significant % 64) as u64, SIGNIFICANT_BITS);
                w.write_bits(xor >> trailing, significant);
                self.window = Some(window);
            }
        }
    }
}

///
/// Decoder side value state.
#[derive(Debug, Clone, Default)]
pub struct ValueDecompressor {
    pub val: u64,
    pub window: Option<XorWindow>,
}

impl ValueDecompressor {
    fn read_window(r: &mut BitReader) -> Result<XorWindow> {
        let leading = r.read_bits(LEADING_BITS)? as u32;
        let significant = match r.read_bits(SIGNIFICANT_BITS)? as u32 {
            0 => 64,
            significant => significant,
        };
        let trailing = 64u32
            .checked_sub(leading + significant)
            .ok_or_else(|| {
                Error::Corrupt(format!(
                    "xor window overflows [leading={}, significant={}]",
                    leading, significant
                ))
            })?;
        Ok(XorWindow { leading, trailing })
    }
}

impl Decompressor<f64> for ValueDecompressor {
    fn decompress_first(&mut self, r: &mut BitReader) -> Result<f64> {
        self.val = r.read_bits(64)?;
        Ok(f64::from_bits(self.val))
    }

    fn decompress(&mut self, r: &mut BitReader) -> Result<f64> {
        if !r.read_bit()? {
            return Ok(f64::from_bits(self.val));
        }
        let window = if r.read_bit()? {
            let window = Self::read_window(r)?;
            self.window = Some(window);
            window
        } else {
            self.window.unwrap_or_default()
        };
        let bits = r.read_bits(window.significant())?;
        self.val ^= bits << window.trailing;
        Ok(f64::from_bits(self.val))
    }
}
