//! Decoder.

use super::{constants::*, header::Header, index::IndexTable, numbers::Width};
use crate::{
    class::{Class, Instance},
    errors::MarshalError,
    key::{Key, Symbol},
    typed::TypedArray,
    vecmap::VecMap,
    Regex, Value,
};
use byteorder::{ByteOrder, LittleEndian};
use failure::{bail, Error};
use log::{debug, warn};
use num_bigint::BigInt;
use smallvec::SmallVec;
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

/// A decoded child slot.
#[derive(Debug)]
enum Slot {
    /// A datum, or a reference to some other container.
    Value(Value),
    /// A reference to the container being decoded.
    Itself,
}

impl Slot {
    /// Fills a deferred self-reference with the finished container.
    fn settle(self, this: &Value) -> Value {
        match self {
            Slot::Value(v) => v,
            Slot::Itself => this.clone(),
        }
    }
}

#[derive(Debug)]
/// Decoding context for a single buffer.
///
/// The decoder reads the header when it is created, then decodes datums at
/// any offset on demand. Containers are registered at the offset of their tag
/// as soon as their shell exists, so references to them resolve while their
/// children are still being read.
pub struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    header: Header,
    classes: &'a [Class],
    objects: HashMap<u32, Value>,
    resolving: HashSet<u32>,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over `input`, reading its header. `classes` resolves
    /// class slots; unknown slots decode as records.
    pub fn new(input: &'a [u8], classes: &'a [Class]) -> Result<Decoder<'a>, Error> {
        let mut decoder = Decoder {
            input,
            pos: HEADER_OFFSET,
            header: Header::default(),
            classes,
            objects: HashMap::new(),
            resolving: HashSet::new(),
        };

        let record = decoder.read_datum()?;
        decoder.header = Header::from_value(&record)?;
        decoder.objects.clear();

        if decoder.header.version != VERSION {
            warn!(
                "The buffer was written by format version {} and this is version {}, some values may not decode as expected",
                decoder.header.version, VERSION
            );
        }
        if decoder.header.big_endian {
            warn!("The buffer claims to be big endian, reading it as little endian");
        }

        Ok(decoder)
    }

    /// The header read from the buffer.
    pub fn header(&self) -> &Header { &self.header }

    /// Decodes the datum starting at `offset`.
    pub fn decode_at(&mut self, offset: usize) -> Result<Value, Error> {
        self.pos = offset;
        let value = self.read_datum()?;
        debug!(
            "decoded {} at offset {}, {} containers",
            value.kind(),
            offset,
            self.objects.len()
        );
        Ok(value)
    }

    /// Decodes the payload.
    pub fn decode_payload(&mut self) -> Result<Value, Error> { self.decode_at(PAYLOAD_START) }

    /// Decodes the container registered in the index table under `name`.
    pub fn decode_indexed(&mut self, name: &str) -> Result<Value, Error> {
        self.pos = 0;
        let table_at = self.read_u32()?;
        let table = IndexTable::from_value(&self.decode_at(table_at as usize)?);
        let offset = table.lookup(name)?;
        self.decode_at(offset as usize)
    }

    #[inline]
    fn eof(&self, wanted: usize) -> Error {
        MarshalError::UnexpectedEof {
            wanted,
            at: self.pos,
            len: self.input.len(),
        }
        .into()
    }

    #[inline]
    fn take_byte(&mut self) -> Result<u8, Error> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn peek_byte(&self) -> Result<u8, Error> {
        match self.input.get(self.pos) {
            Some(byte) => Ok(*byte),
            None => Err(self.eof(1)),
        }
    }

    #[inline]
    fn read_many(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let input: &'a [u8] = self.input;
        match self.pos.checked_add(len) {
            Some(end) if end <= input.len() => {
                let bs = &input[self.pos..end];
                self.pos = end;
                Ok(bs)
            }
            _ => Err(self.eof(len)),
        }
    }

    #[inline]
    fn read_u32(&mut self) -> Result<u32, Error> {
        let bs = self.read_many(4)?;
        Ok(LittleEndian::read_u32(bs))
    }

    #[inline]
    fn read_i64(&mut self) -> Result<i64, Error> {
        let bs = self.read_many(8)?;
        Ok(LittleEndian::read_i64(bs))
    }

    #[inline]
    fn read_width(&mut self, width: Width) -> Result<f64, Error> {
        let bs = self.read_many(width.size())?;
        Ok(width.read(bs))
    }

    /// Entry counts are bounded by what is left of the input, since every
    /// entry takes at least a byte.
    fn read_count(&mut self) -> Result<usize, Error> {
        let count = self.read_u32()? as usize;
        if count > self.input.len().saturating_sub(self.pos) {
            return Err(self.eof(count));
        }
        Ok(count)
    }

    fn read_text(&mut self) -> Result<String, Error> {
        let len = self.read_u32()? as usize;
        let bs = self.read_many(len)?;
        Ok(String::from_utf8_lossy(bs).into_owned())
    }

    fn read_datum(&mut self) -> Result<Value, Error> {
        let at = self.pos;
        let tag = self.take_byte()?;

        let value = match tag {
            TAG_STRING => Value::Str(self.read_text()?),
            TAG_SYMBOL => Value::Symbol(Symbol::new(&self.read_text()?)),
            TAG_TRUE => Value::Bool(true),
            TAG_FALSE => Value::Bool(false),
            TAG_NULL => Value::Null,
            TAG_UNDEFINED => Value::Undefined,
            TAG_I64 => Value::BigInt(BigInt::from(self.read_i64()?)),
            TAG_DATE => Value::Date(self.read_i64()?),
            TAG_REF => {
                let target = self.read_u32()?;
                self.resolve(target)?
            }
            TAG_REGEX => self.read_regex()?,
            TAG_ARRAY | TAG_SET | TAG_RECORD | TAG_MAP | TAG_CLASS => self.read_container(at, tag)?,
            TAG_U8_ARRAY | TAG_I8_ARRAY | TAG_U16_ARRAY | TAG_I16_ARRAY | TAG_U32_ARRAY | TAG_I32_ARRAY => {
                self.read_container(at, tag)?
            }
            TAG_TERMINATOR | TAG_U8_CLAMPED => return Err(MarshalError::UnknownTag { tag, at }.into()),
            _ => match Width::from_tag(tag) {
                Some(width) => Value::Number(self.read_width(width)?),
                None => return Err(MarshalError::UnknownTag { tag, at }.into()),
            },
        };
        Ok(value)
    }

    /// Decodes the container whose tag is at `at`. A container that was
    /// already decoded is skipped over and the existing value returned.
    fn read_container(&mut self, at: usize, tag: u8) -> Result<Value, Error> {
        if let Some(existing) = self.objects.get(&(at as u32)).cloned() {
            self.skip_body(tag)?;
            return Ok(existing);
        }
        match tag {
            TAG_ARRAY => self.read_elements(at, false),
            TAG_SET => self.read_elements(at, true),
            TAG_RECORD => self.read_record(at),
            TAG_MAP => self.read_map(at),
            TAG_CLASS => self.read_instance(at),
            _ => self.read_typed(at, tag),
        }
    }

    fn register(&mut self, at: usize, value: &Value) { self.objects.insert(at as u32, value.clone()); }

    /// Resolves a reference that is not to the enclosing container.
    fn resolve(&mut self, target: u32) -> Result<Value, Error> {
        if let Some(v) = self.objects.get(&target) {
            return Ok(v.clone());
        }

        // the target lies outside what has been decoded so far
        if (target as usize) < PAYLOAD_START || !self.resolving.insert(target) {
            return Err(MarshalError::DanglingReference(target).into());
        }
        let saved = self.pos;
        self.pos = target as usize;
        let res = self.read_datum();
        self.pos = saved;
        self.resolving.remove(&target);

        match res {
            Ok(ref v) if v.identity().is_some() => Ok(v.clone()),
            _ => Err(MarshalError::DanglingReference(target).into()),
        }
    }

    fn read_slot(&mut self, container: usize) -> Result<Slot, Error> {
        if self.header.has_references && self.peek_byte()? == TAG_REF {
            self.pos += 1;
            let target = self.read_u32()?;
            if target as usize == container {
                return Ok(Slot::Itself);
            }
            return self.resolve(target).map(Slot::Value);
        }
        self.read_datum().map(Slot::Value)
    }

    fn read_key(&mut self) -> Result<Key, Error> {
        if self.header.plain_keys() {
            self.take_byte()?;
            return Ok(Key::Str(self.read_text()?));
        }

        let at = self.pos;
        let tag = self.take_byte()?;
        Ok(match tag {
            TAG_STRING => Key::Str(self.read_text()?),
            TAG_SYMBOL => Key::Symbol(Symbol::new(&self.read_text()?)),
            TAG_INDEX => Key::Symbol(Symbol::index()),
            _ => match Width::from_tag(tag) {
                Some(width) => Key::Number(self.read_width(width)?),
                None => return Err(MarshalError::UnknownKeyTag { tag, at }.into()),
            },
        })
    }

    fn read_map_key(&mut self) -> Result<Value, Error> { self.read_key().map(Key::into_value) }

    /// Reads `len` key and slot pairs of the container at `at`.
    fn read_entries<K>(
        &mut self,
        at: usize,
        len: usize,
        read_key: fn(&mut Self) -> Result<K, Error>,
    ) -> Result<SmallVec<[(K, Slot); 8]>, Error> {
        let mut entries = SmallVec::with_capacity(len);
        for _ in 0..len {
            let key = read_key(self)?;
            let slot = self.read_slot(at)?;
            entries.push((key, slot));
        }
        Ok(entries)
    }

    fn read_elements(&mut self, at: usize, set: bool) -> Result<Value, Error> {
        let len = self.read_count()?;
        let cell = Rc::new(RefCell::new(Vec::with_capacity(len)));
        let value = if set {
            Value::Set(cell.clone())
        } else {
            Value::Array(cell.clone())
        };
        if len == 0 {
            return Ok(value);
        }
        self.register(at, &value);

        let mut slots: SmallVec<[Slot; 8]> = SmallVec::with_capacity(len);
        for _ in 0..len {
            slots.push(self.read_slot(at)?);
        }
        cell.borrow_mut()
            .extend(slots.into_iter().map(|slot| slot.settle(&value)));
        Ok(value)
    }

    fn read_record(&mut self, at: usize) -> Result<Value, Error> {
        let len = self.read_count()?;
        let cell = Rc::new(RefCell::new(VecMap::with_capacity(len)));
        let value = Value::Record(cell.clone());
        if len == 0 {
            return Ok(value);
        }
        self.register(at, &value);

        let entries = self.read_entries(at, len, Self::read_key)?;
        fill(&mut cell.borrow_mut(), entries, &value);
        Ok(value)
    }

    fn read_map(&mut self, at: usize) -> Result<Value, Error> {
        let len = self.read_count()?;
        let cell = Rc::new(RefCell::new(VecMap::with_capacity(len)));
        let value = Value::Map(cell.clone());
        if len == 0 {
            return Ok(value);
        }
        self.register(at, &value);

        let entries = self.read_entries(at, len, Self::read_map_key)?;
        fill(&mut cell.borrow_mut(), entries, &value);
        Ok(value)
    }

    fn read_instance(&mut self, at: usize) -> Result<Value, Error> {
        let slot = self.read_u32()? as usize;
        let len = self.read_count()?;

        // instances are registered even when empty, since the encoder tracks them
        match self.classes.get(slot) {
            Some(class) => {
                let inst = Instance::new(class.clone(), VecMap::with_capacity(len));
                let cell = Rc::new(RefCell::new(inst));
                let value = Value::Instance(cell.clone());
                self.register(at, &value);

                let entries = self.read_entries(at, len, Self::read_key)?;
                fill(&mut cell.borrow_mut().fields, entries, &value);
                Ok(value)
            }
            None => {
                debug!("no class for slot {} at offset {}, decoding a record", slot, at);
                let cell = Rc::new(RefCell::new(VecMap::with_capacity(len)));
                let value = Value::Record(cell.clone());
                self.register(at, &value);

                let entries = self.read_entries(at, len, Self::read_key)?;
                fill(&mut cell.borrow_mut(), entries, &value);
                Ok(value)
            }
        }
    }

    fn read_typed(&mut self, at: usize, tag: u8) -> Result<Value, Error> {
        let len = self.read_u32()? as usize;
        let size = match tag {
            TAG_U8_ARRAY | TAG_I8_ARRAY => 1,
            TAG_U16_ARRAY | TAG_I16_ARRAY => 2,
            _ => 4,
        };
        let byte_len = match len.checked_mul(size) {
            Some(n) => n,
            None => return Err(self.eof(usize::max_value())),
        };
        let raw = self.read_many(byte_len)?;

        let arr = match tag {
            TAG_U8_ARRAY => TypedArray::U8(raw.to_vec()),
            TAG_I8_ARRAY => TypedArray::I8(raw.iter().map(|b| *b as i8).collect()),
            TAG_U16_ARRAY => {
                let mut v = vec![0; len];
                LittleEndian::read_u16_into(raw, &mut v);
                TypedArray::U16(v)
            }
            TAG_I16_ARRAY => {
                let mut v = vec![0; len];
                LittleEndian::read_i16_into(raw, &mut v);
                TypedArray::I16(v)
            }
            TAG_U32_ARRAY => {
                let mut v = vec![0; len];
                LittleEndian::read_u32_into(raw, &mut v);
                TypedArray::U32(v)
            }
            _ => {
                let mut v = vec![0; len];
                LittleEndian::read_i32_into(raw, &mut v);
                TypedArray::I32(v)
            }
        };

        let value = Value::typed(arr);
        if len > 0 {
            self.register(at, &value);
        }
        Ok(value)
    }

    fn read_regex(&mut self) -> Result<Value, Error> {
        let attrs = self.read_datum()?;
        if !attrs.is_record() {
            bail!("Regex attributes should be a record, found {}", attrs.kind());
        }
        let text = |key: &str| match attrs.get(key) {
            Some(Value::Str(s)) => s,
            _ => String::new(),
        };
        let last_index = match attrs.get("lastIndex") {
            Some(Value::Number(n)) if n >= 0.0 && n <= u32::max_value() as f64 => n as u32,
            _ => 0,
        };
        Ok(Value::Regex(Regex {
            source: text("source"),
            flags: text("flags"),
            last_index,
        }))
    }

    /// Advances past the body of a datum whose tag was just read.
    fn skip_body(&mut self, tag: u8) -> Result<(), Error> {
        match tag {
            TAG_STRING | TAG_SYMBOL => {
                let len = self.read_u32()? as usize;
                self.read_many(len)?;
            }
            TAG_TRUE | TAG_FALSE | TAG_NULL | TAG_UNDEFINED => {}
            TAG_I64 | TAG_DATE => {
                self.read_many(8)?;
            }
            TAG_REF => {
                self.read_many(4)?;
            }
            TAG_REGEX => self.skip_datum()?,
            TAG_ARRAY | TAG_SET => {
                let len = self.read_count()?;
                for _ in 0..len {
                    self.skip_datum()?;
                }
            }
            TAG_CLASS => {
                self.read_many(4)?;
                self.skip_entries()?;
            }
            TAG_RECORD | TAG_MAP => self.skip_entries()?,
            TAG_U8_ARRAY | TAG_I8_ARRAY => {
                let len = self.read_u32()? as usize;
                self.read_many(len)?;
            }
            TAG_U16_ARRAY | TAG_I16_ARRAY | TAG_U32_ARRAY | TAG_I32_ARRAY => {
                let size = if tag == TAG_U16_ARRAY || tag == TAG_I16_ARRAY { 2 } else { 4 };
                let len = self.read_u32()? as usize;
                match len.checked_mul(size) {
                    Some(n) => {
                        self.read_many(n)?;
                    }
                    None => return Err(self.eof(usize::max_value())),
                }
            }
            _ => match Width::from_tag(tag) {
                Some(width) => {
                    self.read_many(width.size())?;
                }
                None => {
                    return Err(MarshalError::UnknownTag {
                        tag,
                        at: self.pos - 1,
                    }
                    .into())
                }
            },
        }
        Ok(())
    }

    fn skip_datum(&mut self) -> Result<(), Error> {
        let tag = self.take_byte()?;
        self.skip_body(tag)
    }

    fn skip_entries(&mut self) -> Result<(), Error> {
        let len = self.read_count()?;
        for _ in 0..len {
            self.read_key()?;
            self.skip_datum()?;
        }
        Ok(())
    }
}

fn fill<K: PartialEq>(map: &mut VecMap<K, Value>, entries: SmallVec<[(K, Slot); 8]>, this: &Value) {
    for (k, slot) in entries {
        map.push_unchecked(k, slot.settle(this));
    }
}
