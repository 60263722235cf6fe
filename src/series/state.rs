use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::HEADER_BITS;
use crate::compression::value::XorWindow;
use crate::error::*;

/// Persisted `leading` value meaning no XOR window has been established.
pub const UNSET_LEADING: u8 = u8::MAX;

const STATE_VERSION: u8 = 1;
// version + t0, t, t_delta + val + leading, trailing, pending_bits, finished + buf len
const FIXED_LEN: usize = 1 + 4 * 3 + 8 + 4 + 8;

///
/// Everything needed to resume a series exactly where it stopped. Restoring it and pushing
/// more points produces the same bits as never having stopped.
///
/// Encoded layout, little endian:
/// ```text
///   version u8 | t0 u32 | t u32 | t_delta u32 | val u64
///   | leading u8 | trailing u8 | pending_bits u8 | finished u8
///   | buf len u64 | buf
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesState {
    pub t0: u32,
    pub t: u32,
    pub t_delta: u32,
    /// Raw bits of the last value.
    pub val: u64,
    pub leading: u8,
    pub trailing: u8,
    pub buf: Bytes,
    /// Valid bits in the trailing partial byte of `buf`, 0 when byte aligned.
    pub pending_bits: u8,
    pub finished: bool,
}

impl SeriesState {
    pub(crate) fn window_fields(window: Option<XorWindow>) -> (u8, u8) {
        match window {
            Some(window) => (window.leading as u8, window.trailing as u8),
            None => (UNSET_LEADING, 0),
        }
    }

    ///
    /// Checks the fields a writer cannot resume from and returns the XOR window.
    pub(crate) fn validate(&self) -> Result<Option<XorWindow>> {
        if self.pending_bits >= 8 {
            return Err(Error::Corrupt(format!(
                "pending bits out of range [pending_bits={}]",
                self.pending_bits
            )));
        }
        if self.buf.len() * 8 < HEADER_BITS as usize {
            return Err(Error::Corrupt(format!(
                "buffer shorter than header [len={}]",
                self.buf.len()
            )));
        }
        if self.finished && self.pending_bits != 0 {
            return Err(Error::Corrupt(String::from(
                "finished series is not byte aligned",
            )));
        }
        if self.leading == UNSET_LEADING {
            return Ok(None);
        }
        let (leading, trailing) = (self.leading as u32, self.trailing as u32);
        if leading > 31 || leading + trailing >= 64 {
            return Err(Error::Corrupt(format!(
                "invalid xor window [leading={}, trailing={}]",
                leading, trailing
            )));
        }
        Ok(Some(XorWindow { leading, trailing }))
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(FIXED_LEN + self.buf.len());
        buf.put_u8(STATE_VERSION);
        buf.put_u32_le(self.t0);
        buf.put_u32_le(self.t);
        buf.put_u32_le(self.t_delta);
        buf.put_u64_le(self.val);
        buf.put_u8(self.leading);
        buf.put_u8(self.trailing);
        buf.put_u8(self.pending_bits);
        buf.put_u8(self.finished as u8);
        buf.put_u64_le(self.buf.len() as u64);
        buf.put_slice(&self.buf);
    }

    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.remaining() < FIXED_LEN {
            return Err(Error::Corrupt(format!(
                "truncated state [len={}]",
                buf.remaining()
            )));
        }
        let version = buf.get_u8();
        if version != STATE_VERSION {
            return Err(Error::Corrupt(format!(
                "unknown state version [version={}]",
                version
            )));
        }
        let t0 = buf.get_u32_le();
        let t = buf.get_u32_le();
        let t_delta = buf.get_u32_le();
        let val = buf.get_u64_le();
        let leading = buf.get_u8();
        let trailing = buf.get_u8();
        let pending_bits = buf.get_u8();
        let finished = match buf.get_u8() {
            0 => false,
            1 => true,
            other => {
                return Err(Error::Corrupt(format!(
                    "invalid finished flag [flag={}]",
                    other
                )))
            }
        };
        let len = buf.get_u64_le() as usize;
        if buf.remaining() != len {
            return Err(Error::Corrupt(format!(
                "buffer length mismatch [expected={}, actual={}]",
                len,
                buf.remaining()
            )));
        }
        let state = SeriesState {
            t0,
            t,
            t_delta,
            val,
            leading,
            trailing,
            buf: Bytes::copy_from_slice(buf),
            pending_bits,
            finished,
        };
        state.validate()?;
        Ok(state)
    }
}
