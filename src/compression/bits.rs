use bytes::{BufMut, Bytes, BytesMut};

use crate::error::*;

///
/// Append only bit buffer. Bits are packed most significant first, `count` tracks how many
/// bits of the last byte are still free (0..=8). Unwritten bits are always zero.
#[derive(Clone, Debug, Default)]
pub struct BitWriter {
    inner: BytesMut,
    count: u8,
}

impl BitWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
            count: 0,
        }
    }

    ///
    /// Rebuild a writer over `inner` whose last byte holds `pending_bits` valid bits
    /// (0 when the buffer is byte aligned). Counts outside 1..8 resume byte aligned.
    pub(crate) fn resume(inner: BytesMut, pending_bits: u8) -> Self {
        let count = match pending_bits {
            1..=7 if !inner.is_empty() => 8 - pending_bits,
            _ => 0,
        };
        Self { inner, count }
    }

    pub fn on(&mut self) {
        self.write_bit(true)
    }

    pub fn off(&mut self) {
        self.write_bit(false)
    }

    pub fn write_bit(&mut self, bit: bool) {
        if self.count == 0 {
            self.inner.put_u8(0);
            self.count = 8;
        }
        if bit {
            let last = self.inner.len() - 1;
            self.inner[last] |= 1 << (self.count - 1);
        }
        self.count -= 1;
    }

    pub fn write_byte(&mut self, byte: u8) {
        match self.count {
            0 => self.inner.put_u8(byte),
            count => {
                let last = self.inner.len() - 1;
                self.inner[last] |= byte >> (8 - count);
                self.inner.put_u8(byte << count);
            }
        }
    }

    ///
    /// Writes the low `bits_to_write` bits of `to_write`, most significant first.
    pub fn write_bits(&mut self, to_write: u64, mut bits_to_write: u32) {
        assert!(bits_to_write <= 64);
        if bits_to_write == 0 {
            return;
        }
        // left align so the high bits of `to_write` fall off
        let mut to_write = to_write << (64 - bits_to_write);
        while bits_to_write >= 8 {
            self.write_byte((to_write >> 56) as u8);
            to_write <<= 8;
            bits_to_write -= 8;
        }
        while bits_to_write > 0 {
            self.write_bit(to_write >> 63 == 1);
            to_write <<= 1;
            bits_to_write -= 1;
        }
    }

    ///
    /// Zero fill the rest of the last byte.
    pub fn pad_to_byte(&mut self) {
        self.count = 0;
    }

    pub fn len_bits(&self) -> usize {
        self.inner.len() * 8 - self.count as usize
    }

    ///
    /// Valid bits in the trailing partial byte, 0 when byte aligned.
    pub fn pending_bits(&self) -> u8 {
        (8 - self.count) % 8
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    ///
    /// Copy of the written bytes, the trailing partial byte included.
    pub fn bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.inner)
    }

    pub fn freeze(self) -> BitReader {
        BitReader::from(self.inner.freeze())
    }
}

///
/// Sequential reader over an immutable buffer. Reads never consume anything on failure.
#[derive(Clone, Debug)]
pub struct BitReader {
    inner: Bytes,
    pos: usize,
}

impl From<Bytes> for BitReader {
    fn from(value: Bytes) -> Self {
        Self {
            inner: value,
            pos: 0,
        }
    }
}

impl BitReader {
    pub fn remaining(&self) -> usize {
        self.inner.len() * 8 - self.pos
    }

    fn ensure(&self, needed: u32) -> Result<()> {
        let remaining = self.remaining();
        if remaining < needed as usize {
            return Err(Error::EndOfData { needed, remaining });
        }
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        self.ensure(1)?;
        let byte = self.inner[self.pos / 8];
        let bit = byte & (0x80 >> (self.pos % 8)) != 0;
        self.pos += 1;
        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        self.ensure(8)?;
        let idx = self.pos / 8;
        let offset = self.pos % 8;
        let byte = if offset == 0 {
            self.inner[idx]
        } else {
            (self.inner[idx] << offset) | (self.inner[idx + 1] >> (8 - offset))
        };
        self.pos += 8;
        Ok(byte)
    }

    pub fn read_bits(&mut self, mut bits_to_read: u32) -> Result<u64> {
        assert!(bits_to_read <= 64);
        self.ensure(bits_to_read)?;
        let mut acc = 0u64;
        while bits_to_read >= 8 {
            acc = (acc << 8) | self.read_byte()? as u64;
            bits_to_read -= 8;
        }
        while bits_to_read > 0 {
            acc = (acc << 1) | self.read_bit()? as u64;
            bits_to_read -= 1;
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod test {
    use rand::random;

    use super::*;

    #[test]
    fn round_trip_single_bit() {
        let mut writer = BitWriter::default();
        writer.on();
        writer.off();
        writer.on();
        writer.on();

        assert_eq!(writer.as_slice(), &[0b1011_0000]);
        assert_eq!(writer.pending_bits(), 4);
        let mut reader = writer.freeze();
        assert_eq!(reader.read_bit().unwrap(), true);
        assert_eq!(reader.read_bit().unwrap(), false);
        assert_eq!(reader.read_bit().unwrap(), true);
        assert_eq!(reader.read_bit().unwrap(), true);
        // padding of the partial byte is readable as zeros
        assert_eq!(reader.remaining(), 4);
    }

    #[test]
    fn writer_all_ones() {
        let mut writer = BitWriter::default();
        for _ in 0..256 {
            writer.on();
        }
        assert_eq!(writer.len_bits(), 256);
        assert!(writer.bytes().iter().all(|b| *b == u8::MAX));
    }

    #[test]
    fn writer_all_alternate() {
        let mut writer = BitWriter::default();
        for i in 0..128 {
            if i % 2 == 1 {
                writer.on();
            } else {
                writer.off();
            }
        }
        let mut reader = writer.freeze();
        for i in 0..128 {
            let bit = reader.read_bit().unwrap();
            assert_eq!(bit, i % 2 == 1);
        }
    }

    #[test]
    fn write_byte_unaligned() {
        let mut writer = BitWriter::default();
        writer.write_bits(0b101, 3);
        writer.write_byte(0xFF);
        assert_eq!(writer.as_slice(), &[0b1011_1111, 0b1110_0000]);
        assert_eq!(writer.len_bits(), 11);

        let mut reader = writer.freeze();
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_byte().unwrap(), 0xFF);
    }

    #[test]
    fn write_byte_aligned() {
        let mut writer = BitWriter::default();
        writer.write_byte(0xA5);
        writer.write_bits(0b1, 1);
        writer.pad_to_byte();
        writer.write_byte(0x3C);
        assert_eq!(writer.as_slice(), &[0xA5, 0x80, 0x3C]);
        assert_eq!(writer.len_bits(), 24);
    }

    #[test]
    fn write_bits_ignores_high_bits() {
        let mut writer = BitWriter::default();
        writer.write_bits(u64::MAX, 4);
        writer.write_bits(0, 4);
        assert_eq!(writer.as_slice(), &[0xF0]);
    }

    #[test]
    fn resume_continues_mid_byte() {
        let mut uninterrupted = BitWriter::default();
        uninterrupted.write_bits(0x1FF, 11);
        uninterrupted.write_bits(0x2A, 7);

        let mut first = BitWriter::default();
        first.write_bits(0x1FF, 11);
        let mut resumed =
            BitWriter::resume(BytesMut::from(first.as_slice()), first.pending_bits());
        resumed.write_bits(0x2A, 7);

        assert_eq!(resumed.as_slice(), uninterrupted.as_slice());
        assert_eq!(resumed.len_bits(), uninterrupted.len_bits());
    }

    #[test]
    fn resume_out_of_range_pending_bits_is_aligned() {
        for pending_bits in [8, 9, u8::MAX] {
            let mut writer = BitWriter::resume(BytesMut::from(&[0xAB][..]), pending_bits);
            assert_eq!(writer.len_bits(), 8);
            assert_eq!(writer.pending_bits(), 0);
            writer.write_bits(0b11, 2);
            assert_eq!(writer.as_slice(), &[0xAB, 0b1100_0000]);
        }
        let writer = BitWriter::resume(BytesMut::new(), 3);
        assert_eq!(writer.len_bits(), 0);
    }

    #[test]
    fn clone_is_independent() {
        let mut writer = BitWriter::default();
        writer.write_bits(0b11, 2);
        let snapshot = writer.clone();
        writer.write_bits(0b111111, 6);
        assert_eq!(snapshot.as_slice(), &[0b1100_0000]);
        assert_eq!(snapshot.pending_bits(), 2);
        assert_eq!(writer.as_slice(), &[0xFF]);
    }

    #[test]
    fn read_bit_end_of_data() {
        let mut reader = BitWriter::default().freeze();
        match reader.read_bit() {
            Err(Error::EndOfData { needed, remaining }) => {
                assert_eq!(needed, 1);
                assert_eq!(remaining, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn read_byte_end_of_data_mid_field() {
        let mut reader = BitReader::from(Bytes::from_static(&[1]));
        reader.read_bit().unwrap();
        match reader.read_byte() {
            Err(Error::EndOfData { needed, remaining }) => {
                assert_eq!(needed, 8);
                assert_eq!(remaining, 7);
            }
            other => panic!("unexpected {:?}", other),
        }
        // failed reads leave the cursor alone
        assert_eq!(reader.remaining(), 7);
    }

    #[test]
    fn read_bits_end_of_data() {
        let mut reader = BitReader::from(Bytes::from_static(&[1]));
        assert!(reader.read_bits(9).unwrap_err().is_end_of_data());
        assert_eq!(reader.read_bits(8).unwrap(), 1);
        assert!(reader.read_bits(1).unwrap_err().is_end_of_data());
        assert_eq!(reader.read_bits(0).unwrap(), 0);
    }

    fn do_fixed_bit_test(bits_to_write: u32, expected: u64) {
        let mut writer = BitWriter::default();
        for i in 0..128 {
            if i % bits_to_write == 0 {
                writer.write_bits(expected, bits_to_write);
            } else {
                writer.write_bits(0, bits_to_write);
            }
        }
        let mut reader = writer.freeze();
        for i in 0..128 {
            let bits = reader.read_bits(bits_to_write).unwrap();
            if i % bits_to_write == 0 {
                assert_eq!(bits, expected);
            } else {
                assert_eq!(bits, 0);
            }
        }
    }

    #[test]
    fn writer_all_3bits() {
        do_fixed_bit_test(3, 0x07);
    }

    #[test]
    fn writer_all_7bits() {
        do_fixed_bit_test(7, 0x7F);
    }

    #[test]
    fn writer_all_12bits() {
        do_fixed_bit_test(12, 0xFFF);
    }

    #[test]
    fn writer_all_32bits() {
        do_fixed_bit_test(32, 0xFFFFFFFF);
    }

    #[test]
    fn writer_all_63bits() {
        do_fixed_bit_test(63, 0x7FFFFFFFFFFFFFFF);
    }

    #[test]
    fn writer_all_64bits() {
        do_fixed_bit_test(64, 0xFFFFFFFFFFFFFFFF);
    }

    fn random_read_write(bits_to_write: u32) {
        let mut writer = BitWriter::default();
        let mut expected = vec![];
        // misalign everything that follows
        writer.on();
        for _ in 0..128 {
            let rand: u64 = random();
            let mask = if bits_to_write == 64 {
                u64::MAX
            } else {
                !(u64::MAX << bits_to_write)
            };
            let masked = rand & mask;
            writer.write_bits(masked, bits_to_write);
            expected.push(masked);
        }
        let mut reader = writer.freeze();
        assert_eq!(reader.read_bit().unwrap(), true);
        for expected in expected {
            assert_eq!(reader.read_bits(bits_to_write).unwrap(), expected);
        }
    }

    #[test]
    fn writer_random_3() {
        random_read_write(3);
    }

    #[test]
    fn writer_random_8() {
        random_read_write(8);
    }

    #[test]
    fn writer_random_18() {
        random_read_write(18);
    }

    #[test]
    fn writer_random_64() {
        random_read_write(64);
    }
}
