//! Encoder.

use super::{constants::*, header::Header, index::IndexTable, numbers::*, EncodeOptions, Encoded};
use crate::{
    class::{ClassRegistry, Instance},
    errors::{MarshalError, Warning},
    key::{Key, Symbol},
    typed::TypedArray,
    util::{identity, is_latin1},
    vecmap::VecMap,
    Regex, Shared, Unsupported, Value,
};
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use failure::Error;
use log::{debug, warn};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::collections::HashMap;

/// Converts a length or offset to its `u32` wire form.
fn wire_u32(n: usize) -> Result<u32, Error> {
    if n > u32::max_value() as usize {
        Err(MarshalError::TooLarge.into())
    } else {
        Ok(n as u32)
    }
}

#[derive(Debug)]
/// Encoding context for a single value graph.
///
/// An encoder owns everything one call needs: the output buffer and its
/// cursor, the identity map, the string and number caches, the class registry,
/// the index table and the header flags. It is consumed by
/// [`Encoder::encode`].
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let value = Value::array(vec![Value::from(1), Value::Unsupported(Unsupported::Function)]);
///
/// let encoded = Encoder::new(EncodeOptions::default()).encode(&value).unwrap();
///
/// assert_eq!(encoded.warnings.len(), 1);
/// assert_eq!(decode(&encoded.bytes, &[]).unwrap(), Value::array(vec![1]));
/// ```
pub struct Encoder {
    out: Vec<u8>,
    offset: usize,
    header: Header,
    numbers: NumberCodec,
    strings: HashMap<String, Bytes>,
    objects: HashMap<usize, u32>,
    classes: ClassRegistry,
    index: IndexTable,
    warnings: Vec<Warning>,
}

impl Encoder {
    /// Creates an encoder. A buffer passed in the options is cleared and reused.
    pub fn new(options: EncodeOptions) -> Encoder {
        let mut out = options.buffer.unwrap_or_default();
        out.clear();
        out.resize(PAYLOAD_START, 0);

        Encoder {
            out,
            offset: PAYLOAD_START,
            header: Header {
                dynamic_numbers: options.dynamic_numbers,
                ..Header::default()
            },
            numbers: NumberCodec::default(),
            strings: HashMap::new(),
            objects: HashMap::new(),
            classes: ClassRegistry::new(),
            index: IndexTable::default(),
            warnings: Vec::new(),
        }
    }

    /// Encodes `value`, returning the bytes together with the classes met and
    /// any warnings raised.
    pub fn encode(mut self, value: &Value) -> Result<Encoded, Error> {
        match value {
            Value::Unsupported(u) => {
                self.skip(*u);
                self.write(&[TAG_UNDEFINED]);
            }
            _ => self.put_datum(value)?,
        }
        self.finish()?;

        debug!(
            "encoded {} bytes, {} classes, {} indexed, {} warnings",
            self.out.len(),
            self.classes.len(),
            self.index.entries().len(),
            self.warnings.len()
        );

        Ok(Encoded {
            bytes: self.out,
            classes: self.classes,
            warnings: self.warnings,
        })
    }

    /// Writes the index table, its offset and the header, then trims the buffer.
    fn finish(&mut self) -> Result<(), Error> {
        let index_at = wire_u32(self.offset)?;
        self.put_index_table()?;
        let end = self.offset;

        self.offset = 0;
        self.put_u32(index_at);

        self.offset = HEADER_OFFSET;
        let fields = self.header.fields();
        self.write(&[TAG_RECORD]);
        self.put_fields(HEADER_OFFSET as u32, &fields)?;
        debug_assert!(self.offset <= PAYLOAD_START, "header overran the payload");

        self.offset = end;
        self.out.truncate(end);
        Ok(())
    }

    fn put_index_table(&mut self) -> Result<(), Error> {
        let entries = self.index.entries().clone();
        if entries.is_empty() {
            self.write(&EMPTY_MAP);
            return Ok(());
        }
        self.write(&[TAG_MAP]);
        self.put_len(entries.len())?;
        for (name, offset) in entries.iter() {
            self.put_str(name)?;
            self.put_number(*offset as f64);
        }
        Ok(())
    }

    /// Writes `bs` at the cursor, overwriting or extending the buffer.
    #[inline]
    fn write(&mut self, bs: &[u8]) {
        let end = self.offset + bs.len();
        if end > self.out.len() {
            self.out.resize(end, 0);
        }
        self.out[self.offset..end].copy_from_slice(bs);
        self.offset = end;
    }

    #[inline]
    fn put_u32(&mut self, n: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, n);
        self.write(&buf);
    }

    #[inline]
    fn put_len(&mut self, len: usize) -> Result<(), Error> {
        let len = wire_u32(len)?;
        self.put_u32(len);
        Ok(())
    }

    /// Overwrites the `u32` at `at` without moving the cursor.
    fn patch_u32(&mut self, at: usize, n: u32) { LittleEndian::write_u32(&mut self.out[at..at + 4], n); }

    fn skip(&mut self, u: Unsupported) {
        warn!("Unsupported type '{}', skipping it", u.kind());
        self.warnings.push(Warning::Unsupported(u.kind()));
    }

    fn note_text(&mut self, s: &str) {
        if self.header.ascii_only && !is_latin1(s) {
            self.header.ascii_only = false;
        }
    }

    fn put_datum(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Undefined => self.write(&[TAG_UNDEFINED]),
            Value::Null => self.write(&[TAG_NULL]),
            Value::Bool(true) => self.write(&[TAG_TRUE]),
            Value::Bool(false) => self.write(&[TAG_FALSE]),
            Value::Number(n) => self.put_number(*n),
            Value::BigInt(n) => self.put_bigint(n),
            Value::Str(s) => self.put_str(s)?,
            Value::Symbol(s) => self.put_symbol(s)?,
            Value::Date(ms) => {
                let bs = self.numbers.encode_i64(*ms);
                self.write(&[TAG_DATE]);
                self.write(&bs);
            }
            Value::Regex(re) => self.put_regex(re)?,
            Value::Array(a) => self.put_elements(a, TAG_ARRAY, &EMPTY_ARRAY)?,
            Value::Set(s) => self.put_elements(s, TAG_SET, &EMPTY_SET)?,
            Value::Map(m) => self.put_map(m)?,
            Value::Record(r) => self.put_record(r)?,
            Value::Typed(t) => self.put_typed(t)?,
            Value::Instance(i) => self.put_instance(i)?,
            Value::Unsupported(u) => self.skip(*u),
        }
        Ok(())
    }

    fn put_number(&mut self, n: f64) {
        let width = if self.header.dynamic_numbers {
            Width::smallest(n)
        } else {
            Width::F64
        };
        let bs = self.numbers.encode(width, n);
        self.write(&[width.tag()]);
        self.write(&bs);
    }

    fn put_bigint(&mut self, n: &BigInt) {
        let i = match n.to_i64() {
            Some(i) => i,
            None => {
                warn!("BigInt {} does not fit in 64 bits, wrapping it", n);
                self.warnings.push(Warning::TruncatedBigInt);
                LittleEndian::read_i64(&n.to_signed_bytes_le()[..8])
            }
        };
        let bs = self.numbers.encode_i64(i);
        self.write(&[TAG_I64]);
        self.write(&bs);
    }

    fn put_str(&mut self, s: &str) -> Result<(), Error> {
        if s.is_empty() {
            self.write(&EMPTY_STRING);
            return Ok(());
        }
        self.note_text(s);

        if let Some(bs) = self.strings.get(s).cloned() {
            self.write(&bs);
            return Ok(());
        }

        let start = self.offset;
        self.write(&[TAG_STRING]);
        self.put_len(s.len())?;
        self.write(s.as_bytes());
        let encoded = Bytes::from(&self.out[start..self.offset]);
        self.strings.insert(s.to_owned(), encoded);
        Ok(())
    }

    fn put_symbol(&mut self, s: &Symbol) -> Result<(), Error> {
        let desc = s.description();
        if desc.is_empty() {
            self.write(&EMPTY_SYMBOL);
            return Ok(());
        }
        self.note_text(desc);
        self.write(&[TAG_SYMBOL]);
        self.put_len(desc.len())?;
        self.write(desc.as_bytes());
        Ok(())
    }

    fn put_symbol_key(&mut self, s: &Symbol) -> Result<(), Error> {
        self.header.has_symbol_keys = true;
        if s.is_index() {
            self.write(&[TAG_INDEX]);
            Ok(())
        } else {
            self.put_symbol(s)
        }
    }

    fn put_key(&mut self, key: &Key) -> Result<(), Error> {
        match key {
            Key::Str(s) => self.put_str(s),
            Key::Number(n) => {
                self.header.has_numeric_keys = true;
                self.put_number(*n);
                Ok(())
            }
            Key::Symbol(s) => self.put_symbol_key(s),
        }
    }

    fn put_map_key(&mut self, key: &Value) -> Result<(), Error> {
        match key {
            Value::Str(s) => self.put_str(s),
            Value::Number(n) => {
                self.header.has_numeric_keys = true;
                self.put_number(*n);
                Ok(())
            }
            Value::Symbol(s) => self.put_symbol_key(s),
            other => Err(MarshalError::UnsupportedKey(other.kind()).into()),
        }
    }

    /// Writes a reference if `id` was seen before, otherwise records the
    /// cursor as its offset. Returns whether a reference was written.
    fn put_ref(&mut self, id: usize) -> Result<bool, Error> {
        match self.objects.get(&id) {
            Some(&at) => {
                self.header.has_references = true;
                self.write(&[TAG_REF]);
                self.put_u32(at);
                Ok(true)
            }
            None => {
                let at = wire_u32(self.offset)?;
                self.objects.insert(id, at);
                Ok(false)
            }
        }
    }

    fn put_elements(&mut self, rc: &Shared<Vec<Value>>, tag: u8, empty: &[u8]) -> Result<(), Error> {
        let elems = rc.borrow();
        if elems.is_empty() {
            self.write(empty);
            return Ok(());
        }
        if self.put_ref(identity(rc))? {
            return Ok(());
        }

        self.write(&[tag]);
        let count_at = self.offset;
        self.put_len(elems.len())?;

        let mut skipped = 0;
        for elem in elems.iter() {
            if let Value::Unsupported(u) = elem {
                self.skip(*u);
                skipped += 1;
            } else {
                self.put_datum(elem)?;
            }
        }
        if skipped > 0 {
            self.patch_u32(count_at, wire_u32(elems.len() - skipped)?);
        }
        Ok(())
    }

    fn put_record(&mut self, rc: &Shared<VecMap<Key, Value>>) -> Result<(), Error> {
        let fields = rc.borrow();
        if fields.is_empty() {
            self.write(&EMPTY_RECORD);
            return Ok(());
        }
        if self.put_ref(identity(rc))? {
            return Ok(());
        }

        let at = wire_u32(self.offset)?;
        self.write(&[TAG_RECORD]);
        self.put_fields(at, &fields)
    }

    fn put_instance(&mut self, rc: &Shared<Instance>) -> Result<(), Error> {
        let inst = rc.borrow();
        if self.put_ref(identity(rc))? {
            return Ok(());
        }

        let at = wire_u32(self.offset)?;
        let slot = self.classes.slot_of(&inst.class);
        self.write(&[TAG_CLASS]);
        self.put_len(slot)?;
        self.put_fields(at, &inst.fields)
    }

    /// Writes the count and fields of a record or instance whose tag starts at
    /// `at`.
    fn put_fields(&mut self, at: u32, fields: &VecMap<Key, Value>) -> Result<(), Error> {
        let count_at = self.offset;
        self.put_len(fields.len())?;
        let mut skipped = 0;

        if fields.keys().all(Key::is_str) {
            for (k, v) in fields.iter() {
                if let Value::Unsupported(u) = v {
                    self.skip(*u);
                    skipped += 1;
                    continue;
                }
                if let Key::Str(s) = k {
                    self.put_str(s)?;
                }
                self.put_datum(v)?;
            }
        } else {
            let mut indexed = None;
            for (k, v) in fields.iter() {
                if let Value::Unsupported(u) = v {
                    self.skip(*u);
                    skipped += 1;
                    continue;
                }
                if let (true, Value::Str(name)) = (k.is_index(), v) {
                    indexed = Some(name.clone());
                }
                self.put_key(k)?;
                self.put_datum(v)?;
            }
            if let Some(name) = indexed {
                self.index.register(name, at);
            }
        }

        if skipped > 0 {
            self.patch_u32(count_at, wire_u32(fields.len() - skipped)?);
        }
        Ok(())
    }

    fn put_map(&mut self, rc: &Shared<VecMap<Value, Value>>) -> Result<(), Error> {
        let entries = rc.borrow();
        if entries.is_empty() {
            self.write(&EMPTY_MAP);
            return Ok(());
        }
        if self.put_ref(identity(rc))? {
            return Ok(());
        }

        let at = wire_u32(self.offset)?;
        self.write(&[TAG_MAP]);
        let count_at = self.offset;
        self.put_len(entries.len())?;

        let mut skipped = 0;
        let mut indexed = None;
        for (k, v) in entries.iter() {
            if let Value::Unsupported(u) = v {
                self.skip(*u);
                skipped += 1;
                continue;
            }
            if let (Value::Symbol(s), Value::Str(name)) = (k, v) {
                if s.is_index() {
                    indexed = Some(name.clone());
                }
            }
            self.put_map_key(k)?;
            self.put_datum(v)?;
        }

        if let Some(name) = indexed {
            self.index.register(name, at);
        }
        if skipped > 0 {
            self.patch_u32(count_at, wire_u32(entries.len() - skipped)?);
        }
        Ok(())
    }

    fn put_typed(&mut self, rc: &Shared<TypedArray>) -> Result<(), Error> {
        let arr = rc.borrow();
        let tag = typed_tag(&arr);
        if arr.is_empty() {
            self.write(&[tag, 0, 0, 0, 0]);
            return Ok(());
        }
        if self.put_ref(identity(rc))? {
            return Ok(());
        }

        self.write(&[tag]);
        self.put_len(arr.len())?;

        let mut raw = vec![0u8; arr.byte_len()];
        match &*arr {
            TypedArray::U8(v) => raw.copy_from_slice(v),
            TypedArray::I8(v) => {
                for (dst, src) in raw.iter_mut().zip(v.iter()) {
                    *dst = *src as u8;
                }
            }
            TypedArray::U16(v) => LittleEndian::write_u16_into(v, &mut raw),
            TypedArray::I16(v) => LittleEndian::write_i16_into(v, &mut raw),
            TypedArray::U32(v) => LittleEndian::write_u32_into(v, &mut raw),
            TypedArray::I32(v) => LittleEndian::write_i32_into(v, &mut raw),
        }
        self.write(&raw);
        Ok(())
    }

    /// Regexes are written as their tag followed by an untracked record of
    /// their attributes.
    fn put_regex(&mut self, re: &Regex) -> Result<(), Error> {
        let attrs: VecMap<Key, Value> = vec![
            (Key::from("flags"), Value::from(re.flags.as_str())),
            (Key::from("global"), Value::from(re.global())),
            (Key::from("hasIndices"), Value::from(re.has_indices())),
            (Key::from("ignoreCase"), Value::from(re.ignore_case())),
            (Key::from("lastIndex"), Value::from(re.last_index)),
            (Key::from("multiline"), Value::from(re.multiline())),
            (Key::from("source"), Value::from(re.source.as_str())),
            (Key::from("sticky"), Value::from(re.sticky())),
            (Key::from("unicode"), Value::from(re.unicode())),
        ]
        .into();

        self.write(&[TAG_REGEX]);
        let at = wire_u32(self.offset)?;
        self.write(&[TAG_RECORD]);
        self.put_fields(at, &attrs)
    }
}

pub(crate) fn typed_tag(arr: &TypedArray) -> u8 {
    match arr {
        TypedArray::U8(_) => TAG_U8_ARRAY,
        TypedArray::I8(_) => TAG_I8_ARRAY,
        TypedArray::U16(_) => TAG_U16_ARRAY,
        TypedArray::I16(_) => TAG_I16_ARRAY,
        TypedArray::U32(_) => TAG_U32_ARRAY,
        TypedArray::I32(_) => TAG_I32_ARRAY,
    }
}
