//! Fixed-width binary arrays.

use crate::from_fn;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// A fixed-width integer array. The element width and signedness are part of
/// the value and survive a round trip.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let arr = TypedArray::from(vec![-300i16, -400]);
///
/// assert_eq!(arr.len(), 2);
/// assert_eq!(arr.byte_len(), 4);
/// ```
pub enum TypedArray {
    /// Unsigned bytes.
    U8(Vec<u8>),
    /// Signed bytes.
    I8(Vec<i8>),
    /// Unsigned 16-bit integers.
    U16(Vec<u16>),
    /// Signed 16-bit integers.
    I16(Vec<i16>),
    /// Unsigned 32-bit integers.
    U32(Vec<u32>),
    /// Signed 32-bit integers.
    I32(Vec<i32>),
}

use TypedArray::*;

impl TypedArray {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            U8(v) => v.len(),
            I8(v) => v.len(),
            U16(v) => v.len(),
            I16(v) => v.len(),
            U32(v) => v.len(),
            I32(v) => v.len(),
        }
    }

    /// Indicates whether the array has no elements.
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Width of one element in bytes.
    pub fn elem_size(&self) -> usize {
        match self {
            U8(_) | I8(_) => 1,
            U16(_) | I16(_) => 2,
            U32(_) | I32(_) => 4,
        }
    }

    /// Size of the raw element data in bytes.
    pub fn byte_len(&self) -> usize { self.len() * self.elem_size() }
}

from_fn!(TypedArray, Vec<u8>, U8);
from_fn!(TypedArray, Vec<i8>, I8);
from_fn!(TypedArray, Vec<u16>, U16);
from_fn!(TypedArray, Vec<i16>, I16);
from_fn!(TypedArray, Vec<u32>, U32);
from_fn!(TypedArray, Vec<i32>, I32);
