//! Error and warning types.

use failure::Fail;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Fail)]
/// Fatal encode and decode failures.
///
/// Public functions return [`failure::Error`]; use `downcast_ref` to recover
/// one of these.
pub enum MarshalError {
    /// A tag byte that names no datum kind.
    #[fail(display = "unknown tag {} at offset {}", tag, at)]
    UnknownTag {
        /// The byte that was read.
        tag: u8,
        /// Where it was read.
        at: usize,
    },
    /// A key tag that names no key kind.
    #[fail(display = "unknown key tag {} at offset {}", tag, at)]
    UnknownKeyTag {
        /// The byte that was read.
        tag: u8,
        /// Where it was read.
        at: usize,
    },
    /// The index table has no entry under this name.
    #[fail(display = "no index entry named {:?}", _0)]
    IndexNotFound(String),
    /// A map key of a kind that cannot be written as a key.
    #[fail(display = "unsupported map key kind: {}", _0)]
    UnsupportedKey(&'static str),
    /// A reference to an offset holding no decodable container.
    #[fail(display = "reference to offset {} cannot be resolved", _0)]
    DanglingReference(u32),
    /// The buffer ended early.
    #[fail(display = "wanted {} bytes at offset {}, buffer has {}", wanted, at, len)]
    UnexpectedEof {
        /// Bytes requested.
        wanted: usize,
        /// Read position.
        at: usize,
        /// Buffer length.
        len: usize,
    },
    /// The header record is malformed.
    #[fail(display = "malformed header: {}", _0)]
    BadHeader(String),
    /// An offset or count does not fit in 32 bits.
    #[fail(display = "encoded output exceeds the 32-bit offset range")]
    TooLarge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Advisory conditions met during encoding. They never abort an encode.
pub enum Warning {
    /// A value of a kind the format cannot carry was skipped.
    Unsupported(&'static str),
    /// A big integer outside the 64-bit range was wrapped.
    TruncatedBigInt,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::Unsupported(kind) => write!(f, "skipped unsupported value of kind {}", kind),
            Warning::TruncatedBigInt => write!(f, "big integer wrapped to 64 bits"),
        }
    }
}
