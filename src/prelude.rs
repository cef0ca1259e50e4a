//! Common imports.

pub use crate::{
    class::{Class, ClassRegistry, Instance},
    encoding::{
        decode, decode_by_index_name, encode, encode_with_type_registry, read_header, Decoder, EncodeOptions,
        Encoded, Encoder, Header, PAYLOAD_START, VERSION,
    },
    errors::{MarshalError, Warning},
    key::{Key, Symbol},
    rep::*,
    typed::TypedArray,
    vecmap::VecMap,
    Regex, Shared, Unsupported, Value,
};
pub use failure::{bail, format_err, Error};
pub use num_bigint::BigInt;
