//! # Marshal binary encoder and decoder
//!
//! Encode and decode functions.
//!
//! # Example
//!
//! ```
//! use marshal::prelude::*;
//!
//! // a record with a field shared along two paths
//! let shared = Value::array(vec![1, 2, 3]);
//! let value = Value::record(vec![("a", shared.clone()), ("b", shared)]);
//!
//! // encode it with dynamic number widths
//! let bytes = encode(&value, EncodeOptions::default().dynamic_numbers(true)).unwrap();
//!
//! // Note: decoding returns a `Result`
//! let decoded = decode(&bytes, &[]).unwrap();
//!
//! // equal, and the two fields are one array again
//! assert_eq!(decoded, value);
//! assert!(decoded.get("a").unwrap().ptr_eq(&decoded.get("b").unwrap()));
//! ```

use crate::{
    class::{Class, ClassRegistry},
    errors::Warning,
    Value,
};
use failure::Error;

mod constants;
pub use constants::{PAYLOAD_START, VERSION};
pub mod de;
pub use de::Decoder;
pub mod header;
pub use header::Header;
mod index;
mod numbers;
pub mod ser;
pub use ser::Encoder;

#[derive(Clone, Debug, Default)]
/// Options for a single encode.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let opts = EncodeOptions::default()
///     .buffer(Vec::with_capacity(4096))
///     .dynamic_numbers(true);
///
/// let bytes = encode(&Value::from(300), opts).unwrap();
/// assert!(read_header(&bytes).unwrap().dynamic_numbers);
/// ```
pub struct EncodeOptions {
    /// A buffer to write into. Its contents are discarded and its allocation
    /// reused.
    pub buffer: Option<Vec<u8>>,
    /// Write integral numbers at the smallest width that holds them.
    pub dynamic_numbers: bool,
}

impl EncodeOptions {
    /// Sets the buffer to reuse.
    pub fn buffer(mut self, buffer: Vec<u8>) -> EncodeOptions {
        self.buffer = Some(buffer);
        self
    }

    /// Turns dynamic number widths on or off.
    pub fn dynamic_numbers(mut self, on: bool) -> EncodeOptions {
        self.dynamic_numbers = on;
        self
    }
}

#[derive(Debug)]
/// Everything an encode produces.
pub struct Encoded {
    /// The encoded buffer.
    pub bytes: Vec<u8>,
    /// Classes of the encoded instances, in slot order.
    pub classes: ClassRegistry,
    /// Advisory conditions met on the way.
    pub warnings: Vec<Warning>,
}

/// Encodes `value` into a buffer.
///
/// Warnings for skipped values are only logged here; use [`Encoder::encode`]
/// to get them back as [`Warning`]s.
///
/// # Arguments
///
/// * `value: &Value` - The root of the graph to be encoded.
/// * `options: EncodeOptions` - Buffer reuse and number widths.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let bytes = encode(&Value::Null, EncodeOptions::default()).unwrap();
///
/// // header window, the null tag, and an empty index table
/// assert_eq!(bytes.len(), PAYLOAD_START + 1 + 5);
/// ```
pub fn encode(value: &Value, options: EncodeOptions) -> Result<Vec<u8>, Error> {
    Ok(Encoder::new(options).encode(value)?.bytes)
}

/// Encodes `value`, also returning the classes of its instances in slot order.
/// Pass them to [`decode`] to get the instances back.
///
/// Warnings are only logged; [`Encoder::encode`] returns them too.
pub fn encode_with_type_registry(value: &Value, options: EncodeOptions) -> Result<(Vec<u8>, ClassRegistry), Error> {
    let encoded = Encoder::new(options).encode(value)?;
    Ok((encoded.bytes, encoded.classes))
}

/// Decodes a buffer. `classes` maps class slots back to classes; instances of
/// unknown slots come back as records.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let bytes = encode(&Value::from("hello"), EncodeOptions::default()).unwrap();
///
/// // Did the decoding succeed?
/// let dec = match decode(&bytes, &[]) {
///     Ok(value) => value,
///     Err(_e) => panic!("Oh no. Whatever will I do?"),
/// };
///
/// assert_eq!(dec, Value::from("hello"));
/// ```
pub fn decode(bytes: &[u8], classes: &[Class]) -> Result<Value, Error> {
    Decoder::new(bytes, classes)?.decode_payload()
}

/// Decodes only the container registered under `name` in the index table.
/// Fails with [`IndexNotFound`](crate::errors::MarshalError::IndexNotFound) if
/// there is none.
pub fn decode_by_index_name(bytes: &[u8], name: &str, classes: &[Class]) -> Result<Value, Error> {
    Decoder::new(bytes, classes)?.decode_indexed(name)
}

/// Reads the header without decoding the payload.
pub fn read_header(bytes: &[u8]) -> Result<Header, Error> { Ok(Decoder::new(bytes, &[])?.header().clone()) }

#[cfg(test)]
mod tests {
    use super::{constants::*, *};
    use crate::{errors::MarshalError, key::Key, typed::TypedArray, Unsupported};

    fn enc(v: &Value) -> Vec<u8> { encode(v, EncodeOptions::default()).unwrap() }

    fn enc_dyn(v: &Value) -> Vec<u8> { encode(v, EncodeOptions::default().dynamic_numbers(true)).unwrap() }

    fn payload(bytes: &[u8]) -> &[u8] {
        let end = u32_at(bytes, 0) as usize;
        &bytes[PAYLOAD_START..end]
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from(bytes[at])
            | u32::from(bytes[at + 1]) << 8
            | u32::from(bytes[at + 2]) << 16
            | u32::from(bytes[at + 3]) << 24
    }

    #[test]
    fn layout() {
        let out = enc(&Value::from("hello"));

        // index table offset, right after the payload
        assert_eq!(u32_at(&out, 0) as usize, PAYLOAD_START + 1 + 4 + 5);
        // header record
        assert_eq!(out[HEADER_OFFSET], TAG_RECORD);
        assert_eq!(u32_at(&out, HEADER_OFFSET + 1), 7);
        // payload
        assert_eq!(payload(&out), &[TAG_STRING, 5, 0, 0, 0, b'h', b'e', b'l', b'l', b'o']);
        // empty index table
        assert_eq!(&out[out.len() - 5..], &EMPTY_MAP);
        assert_eq!(out.len(), 10 + PAYLOAD_START + 5);
    }

    #[test]
    fn empty_tokens() {
        assert_eq!(payload(&enc(&Value::from(""))), &EMPTY_STRING);
        assert_eq!(payload(&enc(&Value::array(Vec::<Value>::new()))), &EMPTY_ARRAY);
        assert_eq!(payload(&enc(&Value::record(Vec::<(Key, Value)>::new()))), &EMPTY_RECORD);
        assert_eq!(payload(&enc(&Value::map(Vec::<(Value, Value)>::new()))), &EMPTY_MAP);
        assert_eq!(payload(&enc(&Value::set(Vec::<Value>::new()))), &EMPTY_SET);
        assert_eq!(payload(&enc(&Value::Symbol(crate::key::Symbol::new("")))), &EMPTY_SYMBOL);
        assert_eq!(
            payload(&enc(&Value::typed(Vec::<i16>::new()))),
            &[TAG_I16_ARRAY, 0, 0, 0, 0]
        );
    }

    #[test]
    fn empty_containers_are_not_shared() {
        let empty = Value::array(Vec::<Value>::new());
        let out = enc(&Value::array(vec![empty.clone(), empty]));
        let mut expected = vec![TAG_ARRAY, 2, 0, 0, 0];
        expected.extend_from_slice(&EMPTY_ARRAY);
        expected.extend_from_slice(&EMPTY_ARRAY);
        assert_eq!(payload(&out), &expected[..]);
        assert!(!read_header(&out).unwrap().has_references);
    }

    #[test]
    fn constant_tokens() {
        assert_eq!(payload(&enc(&Value::Null)), &[TAG_NULL]);
        assert_eq!(payload(&enc(&Value::Undefined)), &[TAG_UNDEFINED]);
        assert_eq!(payload(&enc(&Value::from(true))), &[TAG_TRUE]);
        assert_eq!(payload(&enc(&Value::from(false))), &[TAG_FALSE]);
    }

    #[test]
    fn doubles_without_dynamic_numbers() {
        for n in &[0.0f64, 300.0, -130.0, 4_294_967_300.0, 1.5] {
            let out = enc(&Value::from(*n));
            let p = payload(&out);
            assert_eq!(p[0], TAG_F64);
            assert_eq!(&p[1..], &n.to_bits().to_le_bytes()[..]);
        }
    }

    #[test]
    fn dynamic_widths() {
        let cases: &[(f64, u8, usize)] = &[
            (7.0, TAG_U8, 1),
            (300.0, TAG_U16, 2),
            (70_000.0, TAG_U32, 4),
            (4_294_967_300.0, TAG_U64, 8),
            (-1.0, TAG_I8, 1),
            (-130.0, TAG_I16, 2),
            (-2_147_483_640.0, TAG_I32, 4),
            (1.5, TAG_F64, 8),
            (-0.0, TAG_F64, 8),
        ];
        for (n, tag, size) in cases {
            let out = enc_dyn(&Value::from(*n));
            let p = payload(&out);
            assert_eq!(p[0], *tag, "tag for {}", n);
            assert_eq!(p.len(), 1 + size, "size for {}", n);
        }
        assert_eq!(payload(&enc_dyn(&Value::from(300))), &[TAG_U16, 0x2c, 0x01]);
        assert_eq!(payload(&enc_dyn(&Value::from(-130))), &[TAG_I16, 0x7e, 0xff]);
    }

    #[test]
    fn dynamic_numbers_decode() {
        for n in &[7.0, 300.0, 70_000.0, 4_294_967_300.0, -1.0, -130.0, -2_147_483_640.0, 0.25] {
            let v = Value::from(*n);
            assert_eq!(decode(&enc_dyn(&v), &[]).unwrap(), v);
        }
    }

    #[test]
    fn i64_width_decodes_as_bigint() {
        let out = enc_dyn(&Value::from(-3_000_000_000i64));
        assert_eq!(payload(&out)[0], TAG_I64);
        assert_eq!(decode(&out, &[]).unwrap(), Value::bigint(-3_000_000_000i64));
    }

    #[test]
    fn bigints_wrap() {
        use num_bigint::BigInt;

        let small = Value::bigint(-5);
        let out = enc(&small);
        assert_eq!(payload(&out)[0], TAG_I64);
        assert_eq!(decode(&out, &[]).unwrap(), small);

        // 2^64 + 7 wraps to 7
        let big = Value::BigInt((BigInt::from(1) << 64) + BigInt::from(7));
        let encoded = Encoder::new(EncodeOptions::default()).encode(&big).unwrap();
        assert_eq!(encoded.warnings, vec![Warning::TruncatedBigInt]);
        assert_eq!(decode(&encoded.bytes, &[]).unwrap(), Value::bigint(7));
    }

    #[test]
    fn strings_are_memoized_verbatim() {
        let v = Value::array(vec!["ab", "ab"]);
        let p = enc(&v);
        let p = payload(&p);
        assert_eq!(&p[5..12], &p[12..19]);
        assert_eq!(&p[5..12], &[TAG_STRING, 2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn ascii_flag() {
        assert!(read_header(&enc(&Value::from("caf\u{e9}"))).unwrap().ascii_only);
        assert!(!read_header(&enc(&Value::from("\u{1f60e}"))).unwrap().ascii_only);
        let sym = Value::Symbol(crate::key::Symbol::new("\u{3bb}"));
        assert!(!read_header(&enc(&sym)).unwrap().ascii_only);
    }

    #[test]
    fn lossy_strings() {
        let mut out = enc(&Value::from("ab"));
        out[PAYLOAD_START + 5] = 0xff;
        assert_eq!(decode(&out, &[]).unwrap(), Value::from("\u{fffd}b"));
    }

    #[test]
    fn self_reference_bytes() {
        let v = Value::record(vec![("a", 1)]);
        v.insert("me", v.clone()).unwrap();
        let out = enc(&v);
        let p = payload(&out);
        // the reference points at the record's own tag
        assert_eq!(&p[p.len() - 5..], &[TAG_REF, PAYLOAD_START as u8, 0, 0, 0]);
        assert!(read_header(&out).unwrap().has_references);
    }

    #[test]
    fn numeric_and_symbol_keys_set_flags() {
        let v = Value::record(vec![(Key::from(1.0), Value::from("one"))]);
        let h = read_header(&enc(&v)).unwrap();
        assert!(h.has_numeric_keys);
        assert!(!h.has_symbol_keys);

        let v = Value::record(vec![(Key::from(crate::key::Symbol::new("s")), Value::Null)]);
        let h = read_header(&enc(&v)).unwrap();
        assert!(h.has_symbol_keys);
    }

    #[test]
    fn unsupported_map_key() {
        let key = Value::array(vec![1]);
        let v = Value::map(vec![(key, Value::from(1))]);
        let err = encode(&v, EncodeOptions::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MarshalError>(),
            Some(&MarshalError::UnsupportedKey("array"))
        );
    }

    #[test]
    fn unsupported_values_shrink_their_container() {
        let f = Value::Unsupported(Unsupported::Function);
        let arr = Value::array(vec![Value::from(1), f.clone(), Value::from(2)]);
        let p = enc(&arr);
        assert_eq!(u32_at(payload(&p), 1), 2);

        let rec = Value::record(vec![("a", Value::from(1)), ("f", f.clone())]);
        assert_eq!(decode(&enc(&rec), &[]).unwrap(), Value::record(vec![("a", 1)]));

        let root = Encoder::new(EncodeOptions::default()).encode(&f).unwrap();
        assert_eq!(root.warnings, vec![Warning::Unsupported("Function")]);
        assert_eq!(decode(&root.bytes, &[]).unwrap(), Value::Undefined);
    }

    #[test]
    fn version_tolerance() {
        let mut out = enc(&Value::from(1));
        // the version string is the first value of the header
        let v_at = out
            .windows(5)
            .position(|w| w == VERSION.as_bytes())
            .unwrap();
        out[v_at..v_at + 5].copy_from_slice(b"9.9.9");
        assert_eq!(read_header(&out).unwrap().version, "9.9.9");
        assert_eq!(decode(&out, &[]).unwrap(), Value::from(1));
    }

    #[test]
    fn unknown_tag() {
        let mut out = enc(&Value::Null);
        out[PAYLOAD_START] = 0xee;
        let err = decode(&out, &[]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MarshalError>(),
            Some(&MarshalError::UnknownTag {
                tag: 0xee,
                at: PAYLOAD_START
            })
        );

        out[PAYLOAD_START] = TAG_U8_CLAMPED;
        assert!(decode(&out, &[]).is_err());
    }

    #[test]
    fn unknown_key_tag() {
        // numeric keys turn off plain keys, so key tags are checked
        let mut out = enc(&Value::record(vec![(Key::from(1.0), Value::Null)]));
        assert!(read_header(&out).unwrap().has_numeric_keys);
        assert_eq!(out[PAYLOAD_START + 5], TAG_F64);

        out[PAYLOAD_START + 5] = 0xee;
        let err = decode(&out, &[]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MarshalError>(),
            Some(&MarshalError::UnknownKeyTag {
                tag: 0xee,
                at: PAYLOAD_START + 5
            })
        );
    }

    #[test]
    fn truncated_input() {
        let out = enc(&Value::from("hello"));
        let err = decode(&out[..PAYLOAD_START + 3], &[]).unwrap_err();
        match err.downcast_ref::<MarshalError>() {
            Some(MarshalError::UnexpectedEof { .. }) => {}
            other => panic!("unexpected error {:?}", other),
        }
        assert!(decode(&out[..3], &[]).is_err());
    }

    #[test]
    fn dangling_reference() {
        let mut out = enc(&Value::Null);
        out.truncate(PAYLOAD_START);
        out.extend_from_slice(&[TAG_REF, 0xff, 0, 0, 0]);
        let err = decode(&out, &[]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MarshalError>(),
            Some(&MarshalError::DanglingReference(0xff))
        );
    }

    #[test]
    fn typed_arrays() {
        let v = Value::typed(vec![-300i16, -400]);
        let out = enc(&v);
        assert_eq!(
            payload(&out),
            &[TAG_I16_ARRAY, 2, 0, 0, 0, 0xd4, 0xfe, 0x70, 0xfe]
        );
        let back = decode(&out, &[]).unwrap();
        match back {
            Value::Typed(t) => assert_eq!(*t.borrow(), TypedArray::I16(vec![-300, -400])),
            other => panic!("expected a typed array, got {:?}", other),
        }
    }

    #[test]
    fn buffer_reuse() {
        let buf = vec![0xaa; 512];
        let out = encode(&Value::Null, EncodeOptions::default().buffer(buf)).unwrap();
        assert_eq!(out, enc(&Value::Null));
    }
}
