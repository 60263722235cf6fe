// Compressors for the two halves of a sample
pub mod bits;
pub mod time;
pub mod value;

use crate::error::*;
use bits::{BitReader, BitWriter};

///
/// Appends encoded items to a bit stream. The first item of a block carries no predecessor
/// and is written in full.
pub trait Compressor<I> {
    fn compress_first(&mut self, w: &mut BitWriter, i: I);
    fn compress(&mut self, w: &mut BitWriter, i: I);
}

///
/// Inverse of a [`Compressor`], reading items back in the order they were written.
pub trait Decompressor<O> {
    fn decompress_first(&mut self, r: &mut BitReader) -> Result<O>;
    fn decompress(&mut self, r: &mut BitReader) -> Result<O>;
}
