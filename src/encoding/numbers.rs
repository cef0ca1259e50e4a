//! Fixed-width number encoding.

use super::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// The width a number is written at.
pub(crate) enum Width {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

use Width::*;

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;
const MIN_I64: f64 = -9_223_372_036_854_775_808.0;

impl Width {
    /// The smallest width that holds `n` exactly. Fractions, non-finite values
    /// and `-0.0` need a double.
    pub(crate) fn smallest(n: f64) -> Width {
        if !n.is_finite() || n.fract() != 0.0 || (n == 0.0 && n.is_sign_negative()) {
            return F64;
        }
        if n >= 0.0 {
            if n <= u8::max_value() as f64 {
                U8
            } else if n <= u16::max_value() as f64 {
                U16
            } else if n <= u32::max_value() as f64 {
                U32
            } else if n < TWO_POW_64 {
                U64
            } else {
                F64
            }
        } else if n >= i8::min_value() as f64 {
            I8
        } else if n >= i16::min_value() as f64 {
            I16
        } else if n >= i32::min_value() as f64 {
            I32
        } else if n >= MIN_I64 {
            I64
        } else {
            F64
        }
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            U8 => TAG_U8,
            U16 => TAG_U16,
            U32 => TAG_U32,
            U64 => TAG_U64,
            I8 => TAG_I8,
            I16 => TAG_I16,
            I32 => TAG_I32,
            I64 => TAG_I64,
            F32 => TAG_F32,
            F64 => TAG_F64,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Width> {
        Some(match tag {
            TAG_U8 => U8,
            TAG_U16 => U16,
            TAG_U32 => U32,
            TAG_U64 => U64,
            TAG_I8 => I8,
            TAG_I16 => I16,
            TAG_I32 => I32,
            TAG_I64 => I64,
            TAG_F32 => F32,
            TAG_F64 => F64,
            _ => return None,
        })
    }

    /// Size in bytes.
    pub(crate) fn size(self) -> usize {
        match self {
            U8 | I8 => 1,
            U16 | I16 => 2,
            U32 | I32 | F32 => 4,
            U64 | I64 | F64 => 8,
        }
    }

    /// The bit pattern of `n` at this width, widened to 64 bits.
    fn bits(self, n: f64) -> u64 {
        match self {
            U8 | U16 | U32 | U64 => n as u64,
            I8 | I16 | I32 | I64 => n as i64 as u64,
            F32 => (n as f32).to_bits() as u64,
            F64 => n.to_bits(),
        }
    }

    fn write_bits(self, bits: u64) -> Bytes {
        let mut buf = [0u8; 8];
        match self.size() {
            1 => buf[0] = bits as u8,
            2 => LittleEndian::write_u16(&mut buf, bits as u16),
            4 => LittleEndian::write_u32(&mut buf, bits as u32),
            _ => LittleEndian::write_u64(&mut buf, bits),
        }
        Bytes::from(&buf[..self.size()])
    }

    /// Reads a number at this width. `bs` holds at least [`Width::size`] bytes.
    pub(crate) fn read(self, bs: &[u8]) -> f64 {
        match self {
            U8 => bs[0] as f64,
            I8 => bs[0] as i8 as f64,
            U16 => LittleEndian::read_u16(bs) as f64,
            I16 => LittleEndian::read_i16(bs) as f64,
            U32 => LittleEndian::read_u32(bs) as f64,
            I32 => LittleEndian::read_i32(bs) as f64,
            U64 => LittleEndian::read_u64(bs) as f64,
            I64 => LittleEndian::read_i64(bs) as f64,
            F32 => LittleEndian::read_f32(bs) as f64,
            F64 => LittleEndian::read_f64(bs),
        }
    }
}

#[derive(Debug, Default)]
/// Encodes numbers, handing out the same bytes for a repeated value and width.
pub(crate) struct NumberCodec {
    cache: HashMap<(Width, u64), Bytes>,
}

impl NumberCodec {
    /// Encodes `n` at `width`, without the tag.
    pub(crate) fn encode(&mut self, width: Width, n: f64) -> Bytes {
        let bits = width.bits(n);
        self.cache
            .entry((width, bits))
            .or_insert_with(|| width.write_bits(bits))
            .clone()
    }

    /// Encodes a 64-bit integer. Big integers and dates go through here.
    pub(crate) fn encode_i64(&mut self, i: i64) -> Bytes {
        let bits = i as u64;
        self.cache
            .entry((I64, bits))
            .or_insert_with(|| I64.write_bits(bits))
            .clone()
    }

    #[cfg(test)]
    fn cached(&self) -> usize { self.cache.len() }
}
