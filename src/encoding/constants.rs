/// Format version written into every header.
pub const VERSION: &str = "0.2.0";

/// Offset of the header record.
pub(crate) const HEADER_OFFSET: usize = 4;
/// Offset of the payload. Bytes between the header and here are padding.
pub const PAYLOAD_START: usize = 100;

/// 0x00, reserved
pub(crate) const TAG_TERMINATOR: u8 = 0;
/// 0x01
pub(crate) const TAG_STRING: u8 = 1;
/// 0x02
pub(crate) const TAG_U8: u8 = 2;
/// 0x03, reserved for clamped bytes
pub(crate) const TAG_U8_CLAMPED: u8 = 3;
/// 0x04
pub(crate) const TAG_U16: u8 = 4;
/// 0x05
pub(crate) const TAG_U32: u8 = 5;
/// 0x06
pub(crate) const TAG_U64: u8 = 6;
/// 0x07
pub(crate) const TAG_I8: u8 = 7;
/// 0x08
pub(crate) const TAG_I16: u8 = 8;
/// 0x09
pub(crate) const TAG_I32: u8 = 9;
/// 0x0a
pub(crate) const TAG_I64: u8 = 10;
/// 0x0b
pub(crate) const TAG_F32: u8 = 11;
/// 0x0c
pub(crate) const TAG_F64: u8 = 12;

/// 0x0d
pub(crate) const TAG_TRUE: u8 = 13;
/// 0x0e
pub(crate) const TAG_FALSE: u8 = 14;
/// 0x0f
pub(crate) const TAG_NULL: u8 = 15;
/// 0x10
pub(crate) const TAG_UNDEFINED: u8 = 16;

/// 0x11
pub(crate) const TAG_ARRAY: u8 = 17;
/// 0x12
pub(crate) const TAG_RECORD: u8 = 18;
/// 0x13
pub(crate) const TAG_SET: u8 = 19;
/// 0x14
pub(crate) const TAG_MAP: u8 = 20;
/// 0x15
pub(crate) const TAG_DATE: u8 = 21;

/// 0x16
pub(crate) const TAG_U8_ARRAY: u8 = 22;
/// 0x17
pub(crate) const TAG_U16_ARRAY: u8 = 23;
/// 0x18
pub(crate) const TAG_U32_ARRAY: u8 = 24;
/// 0x19
pub(crate) const TAG_I8_ARRAY: u8 = 25;
/// 0x1a
pub(crate) const TAG_I16_ARRAY: u8 = 26;
/// 0x1b
pub(crate) const TAG_I32_ARRAY: u8 = 27;

/// 0x1c
pub(crate) const TAG_SYMBOL: u8 = 28;
/// 0x1d
pub(crate) const TAG_CLASS: u8 = 29;
/// 0x1e
pub(crate) const TAG_REGEX: u8 = 30;
/// 0x1f
pub(crate) const TAG_REF: u8 = 31;
/// 0x20, the index marker key
pub(crate) const TAG_INDEX: u8 = 32;

/// A tag followed by a zero `u32` count.
macro_rules! empty {
    ($tag:expr) => {
        [$tag, 0, 0, 0, 0]
    };
}

pub(crate) const EMPTY_STRING: [u8; 5] = empty!(TAG_STRING);
pub(crate) const EMPTY_SYMBOL: [u8; 5] = empty!(TAG_SYMBOL);
pub(crate) const EMPTY_ARRAY: [u8; 5] = empty!(TAG_ARRAY);
pub(crate) const EMPTY_RECORD: [u8; 5] = empty!(TAG_RECORD);
pub(crate) const EMPTY_SET: [u8; 5] = empty!(TAG_SET);
pub(crate) const EMPTY_MAP: [u8; 5] = empty!(TAG_MAP);
