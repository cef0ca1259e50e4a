//! # Marshal
//!
//! Marshal is a binary serialization format for value graphs. It keeps what
//! tree-shaped formats lose: shared references stay shared, cycles survive,
//! fixed-width arrays keep their element type, and class instances keep their
//! class.
//!
//! # Usage
//!
//! Build a [`Value`], [`encode`](encoding::encode) it, and
//! [`decode`](encoding::decode) the bytes back.
//!
//! ```
//! use marshal::prelude::*;
//!
//! let point = Value::record(vec![("x", 1), ("y", 2)]);
//!
//! let bytes = encode(&point, EncodeOptions::default()).unwrap();
//! let decoded = decode(&bytes, &[]).unwrap();
//!
//! assert_eq!(decoded, point);
//! ```
//!
//! # Values
//!
//! Primitives (`undefined`, `null`, booleans, numbers, big integers, strings,
//! symbols, dates and regular expressions) are stored inline. Containers
//! (arrays, sets, maps, records, typed arrays and class instances) are held
//! behind [`Shared`] pointers, and the pointer is their identity.
//!
//! ## Shared references and cycles
//!
//! A container reachable along two paths is written once. The second path
//! becomes a reference, and the decoded graph shares one allocation again.
//! Cycles work the same way.
//!
//! ```
//! use marshal::prelude::*;
//!
//! let node = Value::record(vec![("name", "root")]);
//! node.insert("self", node.clone()).unwrap();
//!
//! let bytes = encode(&node, EncodeOptions::default()).unwrap();
//! let decoded = decode(&bytes, &[]).unwrap();
//!
//! assert!(decoded.get("self").unwrap().ptr_eq(&decoded));
//! ```
//!
//! Values are reference counted, so a cyclic graph is never freed on its own.
//! Break the cycle by removing a field if that matters.
//!
//! ## Classes
//!
//! A [`Value::Instance`](class::Instance) is written with a slot number instead of
//! its class. [`encode_with_type_registry`](encoding::encode_with_type_registry)
//! returns the classes in slot order, and [`decode`](encoding::decode) takes the
//! same list back.
//!
//! ```
//! use marshal::prelude::*;
//!
//! let point = Class::new("Point");
//! let p = point.instantiate(vec![("x".into(), 3.into())]);
//!
//! let (bytes, classes) = encode_with_type_registry(&p, EncodeOptions::default()).unwrap();
//! let decoded = decode(&bytes, &classes).unwrap();
//!
//! assert_eq!(decoded, p);
//!
//! // without the class list the instance comes back as a plain record
//! let plain = decode(&bytes, &[]).unwrap();
//! assert!(plain.is_record());
//! ```
//!
//! ## The index
//!
//! A record, map or instance holding [`Symbol::index()`](key::Symbol::index)
//! with a string value is listed in a table at the end of the buffer, and can be
//! decoded on its own.
//!
//! ```
//! use marshal::prelude::*;
//!
//! let users = Value::record(vec![(Key::from(Symbol::index()), Value::from("users"))]);
//! users.insert("count", 2).unwrap();
//! let root = Value::array(vec![users.clone(), Value::from("other")]);
//!
//! let bytes = encode(&root, EncodeOptions::default()).unwrap();
//! let found = decode_by_index_name(&bytes, "users", &[]).unwrap();
//!
//! assert_eq!(found, users);
//! assert!(decode_by_index_name(&bytes, "missing", &[]).is_err());
//! ```
//!
//! # Wire format
//!
//! This section describes the binary format. Every multi-byte number is little
//! endian.
//!
//! ## Layout
//!
//! | Bytes      | Contents                                     |
//! | ---        | ---                                          |
//! | `0..4`     | `u32` offset of the index table              |
//! | `4..100`   | the header record, zero padded               |
//! | `100..`    | the payload, a single datum                  |
//! | trailer    | the index table, a map from names to offsets |
//!
//! ## Header
//!
//! The header is a record with string keys:
//!
//! | Key  | Value                                             |
//! | ---  | ---                                               |
//! | `v`  | format version, currently `0.2.0`                 |
//! | `be` | big endian, always `false`                        |
//! | `re` | the payload contains references                   |
//! | `hs` | some key is a symbol                              |
//! | `hn` | some key is a number                              |
//! | `aa` | every string is at most U+00FF                    |
//! | `dn` | numbers use the smallest fitting width            |
//!
//! A decoder reading a different version warns and carries on.
//!
//! ## Tags
//!
//! Every datum starts with one tag byte.
//!
//! | Tag | Datum     | Tag | Datum       | Tag | Datum        |
//! | --- | ---       | --- | ---         | --- | ---          |
//! | 1   | string    | 12  | `f64`       | 23  | `u16` array  |
//! | 2   | `u8`      | 13  | `true`      | 24  | `u32` array  |
//! | 4   | `u16`     | 14  | `false`     | 25  | `i8` array   |
//! | 5   | `u32`     | 15  | `null`      | 26  | `i16` array  |
//! | 6   | `u64`     | 16  | `undefined` | 27  | `i32` array  |
//! | 7   | `i8`      | 17  | array       | 28  | symbol       |
//! | 8   | `i16`     | 18  | record      | 29  | class        |
//! | 9   | `i32`     | 19  | set         | 30  | regex        |
//! | 10  | `i64`     | 20  | map         | 31  | reference    |
//! | 11  | `f32`     | 21  | date        | 32  | index marker |
//! | 22  | `u8` array|     |             |     |              |
//!
//! Tags 0 and 3 are reserved.
//!
//! ## Strings and symbols
//!
//! Tag, `u32` byte length, UTF-8 bytes.
//!
//! ## Numbers
//!
//! Tag followed by the number at its width. Without `dn` every number is an
//! `f64`. With it, integers take the smallest of `u8`, `u16`, `u32`, `u64` (or
//! `i8`, `i16`, `i32`, `i64` when negative) that holds them, and everything
//! else stays `f64`. Big integers are always `i64`. Dates are an `i64` count
//! of milliseconds.
//!
//! ## Containers
//!
//! Tag, `u32` entry count, entries. Arrays and sets hold datums, records and
//! maps hold key datum pairs. A class instance has a `u32` class slot between
//! the tag and the count. Typed arrays hold a `u32` element count followed by
//! the raw elements. A regex is its tag followed by a record of its attributes.
//!
//! An empty container other than an instance is always its tag and a zero count.
//!
//! ## Keys
//!
//! When neither `hs` nor `hn` is set, keys are strings. Otherwise each key is a
//! string, number or symbol datum, or the single index marker byte.
//!
//! ## References
//!
//! A container met for the second time is written as the reference tag and the
//! `u32` offset of its first tag byte.
//!
//! ## Index table
//!
//! A map from names to the offsets of the containers that carried them.

#![warn(
    missing_docs,
    deprecated_in_future,
    unsafe_code,
    unused_labels,
    keyword_idents,
    missing_copy_implementations,
    missing_debug_implementations,
    macro_use_extern_crate,
    unreachable_pub,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]
#![allow(clippy::cast_lossless)]

pub mod class;
pub mod encoding;
pub mod errors;
pub mod key;
pub mod prelude;
pub mod rep;
pub mod typed;
pub mod util;
pub mod vecmap;

use class::Instance;
use failure::{bail, Error};
use key::{same_value_zero, Key, Symbol};
use num_bigint::BigInt as BigNum;
use std::{
    cell::{Ref, RefCell},
    collections::HashSet,
    fmt,
    rc::Rc,
};
use typed::TypedArray;
use util::identity;
use vecmap::VecMap;

/// A reference-counted, mutable container. The allocation is the container's
/// identity.
pub type Shared<T> = Rc<RefCell<T>>;

#[derive(Clone)]
/// A node of a value graph.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let v = Value::from("hello");
///
/// match v {
///     Value::Str(ref s) => assert_eq!(s, "hello"),
///     _ => panic!(),
/// }
/// ```
pub enum Value {
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Double precision number.
    Number(f64),
    /// Arbitrary precision integer. Only the low 64 bits are encoded.
    BigInt(BigNum),
    /// String.
    Str(String),
    /// Symbol.
    Symbol(Symbol),
    /// Milliseconds since the Unix epoch.
    Date(i64),
    /// Regular expression.
    Regex(Regex),
    /// Ordered sequence.
    Array(Shared<Vec<Value>>),
    /// Ordered collection of distinct values.
    Set(Shared<Vec<Value>>),
    /// Ordered map with arbitrary keys.
    Map(Shared<VecMap<Value, Value>>),
    /// Ordered map with string, number or symbol keys.
    Record(Shared<VecMap<Key, Value>>),
    /// Fixed-width integer array.
    Typed(Shared<TypedArray>),
    /// Class instance.
    Instance(Shared<Instance>),
    /// A value the format cannot carry. Encoding skips it.
    Unsupported(Unsupported),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Host kinds that have no encoding.
pub enum Unsupported {
    /// A function.
    Function,
    /// A raw byte buffer.
    ArrayBuffer,
    /// A view over a raw byte buffer.
    DataView,
    /// An array of `f32`.
    Float32Array,
    /// An array of `f64`.
    Float64Array,
    /// An array of clamped bytes.
    Uint8ClampedArray,
}

impl Unsupported {
    /// Name of the kind.
    pub fn kind(self) -> &'static str {
        match self {
            Unsupported::Function => "Function",
            Unsupported::ArrayBuffer => "ArrayBuffer",
            Unsupported::DataView => "DataView",
            Unsupported::Float32Array => "Float32Array",
            Unsupported::Float64Array => "Float64Array",
            Unsupported::Uint8ClampedArray => "Uint8ClampedArray",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// A regular expression, kept as its source and flags.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let re = Regex::new("a+b", "gi");
///
/// assert!(re.global());
/// assert!(re.ignore_case());
/// assert!(!re.multiline());
/// ```
pub struct Regex {
    /// Pattern text.
    pub source: String,
    /// Flag characters, such as `gi`.
    pub flags: String,
    /// Position the next match starts at.
    pub last_index: u32,
}

impl Regex {
    /// Creates a regular expression with `last_index` 0.
    pub fn new(source: &str, flags: &str) -> Regex {
        Regex {
            source: source.to_owned(),
            flags: flags.to_owned(),
            last_index: 0,
        }
    }

    fn has_flag(&self, flag: char) -> bool { self.flags.contains(flag) }

    /// The `g` flag.
    pub fn global(&self) -> bool { self.has_flag('g') }

    /// The `d` flag.
    pub fn has_indices(&self) -> bool { self.has_flag('d') }

    /// The `i` flag.
    pub fn ignore_case(&self) -> bool { self.has_flag('i') }

    /// The `m` flag.
    pub fn multiline(&self) -> bool { self.has_flag('m') }

    /// The `y` flag.
    pub fn sticky(&self) -> bool { self.has_flag('y') }

    /// The `u` flag.
    pub fn unicode(&self) -> bool { self.has_flag('u') }
}

fn shared<T>(t: T) -> Shared<T> { Rc::new(RefCell::new(t)) }

impl Value {
    /// Creates an array.
    pub fn array<T: Into<Value>, I: IntoIterator<Item = T>>(items: I) -> Value {
        Value::Array(shared(items.into_iter().map(T::into).collect()))
    }

    /// Creates a set. Later duplicates (by [`Value::same_value`]) are dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use marshal::prelude::*;
    ///
    /// let s = Value::set(vec![1, 2, 1]);
    ///
    /// assert_eq!(s.len(), Some(2));
    /// ```
    pub fn set<T: Into<Value>, I: IntoIterator<Item = T>>(items: I) -> Value {
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !out.iter().any(|v| v.same_value(&item)) {
                out.push(item);
            }
        }
        Value::Set(shared(out))
    }

    /// Creates a map. A later entry whose key is [`Value::same_value`] as an
    /// earlier one replaces that entry's value.
    pub fn map<K: Into<Value>, V: Into<Value>, I: IntoIterator<Item = (K, V)>>(entries: I) -> Value {
        let mut out: VecMap<Value, Value> = VecMap::new();
        for (k, v) in entries {
            let (k, v) = (k.into(), v.into());
            match out.iter().position(|(key, _)| key.same_value(&k)) {
                Some(i) => {
                    if let Some(slot) = out.value_at_mut(i) {
                        *slot = v;
                    }
                }
                None => out.push_unchecked(k, v),
            }
        }
        Value::Map(shared(out))
    }

    /// Creates a record.
    pub fn record<K: Into<Key>, V: Into<Value>, I: IntoIterator<Item = (K, V)>>(fields: I) -> Value {
        Value::Record(shared(
            fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }

    /// Creates a typed array.
    ///
    /// # Example
    ///
    /// ```
    /// use marshal::prelude::*;
    ///
    /// let t = Value::typed(vec![-300i16, -400]);
    ///
    /// assert!(t.is_typed());
    /// assert_eq!(t.len(), Some(2));
    /// ```
    pub fn typed<T: Into<TypedArray>>(arr: T) -> Value { Value::Typed(shared(arr.into())) }

    /// Wraps an instance.
    pub fn instance(inst: Instance) -> Value { Value::Instance(shared(inst)) }

    /// Creates a regular expression.
    pub fn regex(source: &str, flags: &str) -> Value { Value::Regex(self::Regex::new(source, flags)) }

    /// Creates a big integer.
    pub fn bigint<T: Into<BigNum>>(n: T) -> Value { Value::BigInt(n.into()) }

    /// Identity of the container, `None` for primitives.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(a) | Value::Set(a) => Some(identity(a)),
            Value::Map(m) => Some(identity(m)),
            Value::Record(r) => Some(identity(r)),
            Value::Typed(t) => Some(identity(t)),
            Value::Instance(i) => Some(identity(i)),
            _ => None,
        }
    }

    /// Indicates whether both values are the same container.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Containers are the same if they share an allocation, primitives if they
    /// are equal. Numbers treat `NaN` as equal to itself.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self == other,
            _ => false,
        }
    }

    /// Looks up a field of a record or instance, or an entry of a map.
    pub fn get<K: Into<Key>>(&self, key: K) -> Option<Value> {
        let key = key.into();
        match self {
            Value::Record(r) => r.borrow().get(&key).cloned(),
            Value::Instance(i) => i.borrow().fields.get(&key).cloned(),
            Value::Map(m) => {
                let key = key.into_value();
                let map = m.borrow();
                let found = map.iter().find(|(k, _)| k.same_value(&key));
                found.map(|(_, v)| v.clone())
            }
            _ => None,
        }
    }

    /// Inserts a field into a record or instance, or an entry into a map,
    /// returning the previous value.
    ///
    /// This will return an [`Error`] if the value is not keyed.
    pub fn insert<K: Into<Key>, V: Into<Value>>(&self, key: K, value: V) -> Result<Option<Value>, Error> {
        let (key, value) = (key.into(), value.into());
        match self {
            Value::Record(r) => Ok(r.borrow_mut().insert(key, value)),
            Value::Instance(i) => Ok(i.borrow_mut().fields.insert(key, value)),
            Value::Map(m) => {
                let key = key.into_value();
                let mut map = m.borrow_mut();
                match map.iter().position(|(k, _)| k.same_value(&key)) {
                    Some(pos) => Ok(map.value_at_mut(pos).map(|slot| std::mem::replace(slot, value))),
                    None => {
                        map.push_unchecked(key, value);
                        Ok(None)
                    }
                }
            }
            _ => bail!("Value is not a record, instance or map"),
        }
    }

    /// Appends to an array, or adds to a set if absent.
    ///
    /// This will return an [`Error`] if the value is neither.
    pub fn push<V: Into<Value>>(&self, value: V) -> Result<(), Error> {
        let value = value.into();
        match self {
            Value::Array(a) => a.borrow_mut().push(value),
            Value::Set(s) => {
                let mut s = s.borrow_mut();
                if !s.iter().any(|v| v.same_value(&value)) {
                    s.push(value);
                }
            }
            _ => bail!("Value is not an array or set"),
        }
        Ok(())
    }

    /// Number of entries of a container.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(a) | Value::Set(a) => Some(a.borrow().len()),
            Value::Map(m) => Some(m.borrow().len()),
            Value::Record(r) => Some(r.borrow().len()),
            Value::Typed(t) => Some(t.borrow().len()),
            Value::Instance(i) => Some(i.borrow().fields.len()),
            _ => None,
        }
    }

    /// Borrows the elements of an array or set.
    pub fn elements(&self) -> Option<Ref<Vec<Value>>> {
        match self {
            Value::Array(a) | Value::Set(a) => Some(a.borrow()),
            _ => None,
        }
    }

    /// Indicates whether the value is [`Value::Undefined`].
    pub fn is_undefined(&self) -> bool {
        match self {
            Value::Undefined => true,
            _ => false,
        }
    }

    /// Indicates whether the value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            _ => false,
        }
    }

    /// Indicates whether the value is a [`Value::Record`].
    pub fn is_record(&self) -> bool {
        match self {
            Value::Record(_) => true,
            _ => false,
        }
    }

    /// Indicates whether the value is an [`Value::Instance`].
    pub fn is_instance(&self) -> bool {
        match self {
            Value::Instance(_) => true,
            _ => false,
        }
    }

    /// Indicates whether the value is a [`Value::Typed`] array.
    pub fn is_typed(&self) -> bool {
        match self {
            Value::Typed(_) => true,
            _ => false,
        }
    }

    /// Tries to read the value as a number.
    /// This will return an [`Error`] if the value is not a [`Value::Number`].
    pub fn to_number(&self) -> Result<f64, Error> {
        match self {
            Value::Number(n) => Ok(*n),
            _ => bail!("Value is not `Number`"),
        }
    }

    /// Tries to read the value as a boolean.
    /// This will return an [`Error`] if the value is not a [`Value::Bool`].
    pub fn to_bool(&self) -> Result<bool, Error> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => bail!("Value is not `Bool`"),
        }
    }

    /// Tries to read the value as a string.
    /// This will return an [`Error`] if the value is not a [`Value::Str`].
    pub fn to_str(&self) -> Result<&str, Error> {
        match self {
            Value::Str(s) => Ok(s),
            _ => bail!("Value is not `Str`"),
        }
    }

    /// Name of the value's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Date(_) => "date",
            Value::Regex(_) => "regex",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Typed(_) => "typed array",
            Value::Instance(_) => "instance",
            Value::Unsupported(u) => u.kind(),
        }
    }

    fn eq_guarded(&self, other: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
        // pairs already under comparison are assumed equal, so cycles terminate
        fn enter<T>(a: &Shared<T>, b: &Shared<T>, seen: &mut HashSet<(usize, usize)>) -> bool {
            !Rc::ptr_eq(a, b) && seen.insert((identity(a), identity(b)))
        }

        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => same_value_zero(*a, *b),
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a == b,
            (Value::Unsupported(a), Value::Unsupported(b)) => a == b,
            (Value::Typed(a), Value::Typed(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Array(a), Value::Array(b)) | (Value::Set(a), Value::Set(b)) => {
                if !enter(a, b, seen) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.eq_guarded(y, seen))
            }
            (Value::Map(a), Value::Map(b)) => {
                if !enter(a, b, seen) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| {
                        ka.eq_guarded(kb, seen) && va.eq_guarded(vb, seen)
                    })
            }
            (Value::Record(a), Value::Record(b)) => {
                if !enter(a, b, seen) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                fields_eq(&a, &b, seen)
            }
            (Value::Instance(a), Value::Instance(b)) => {
                if !enter(a, b, seen) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.class == b.class && fields_eq(&a.fields, &b.fields, seen)
            }
            _ => false,
        }
    }
}

fn fields_eq(a: &VecMap<Key, Value>, b: &VecMap<Key, Value>, seen: &mut HashSet<(usize, usize)>) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|((ka, va), (kb, vb))| ka == kb && va.eq_guarded(vb, seen))
}

/// Structural equality. Containers are compared by content, in order, and
/// cyclic graphs of the same shape are equal.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool { self.eq_guarded(other, &mut HashSet::new()) }
}

thread_local! {
    static FORMATTING: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

fn fmt_shared<T>(
    rc: &Shared<T>,
    f: &mut fmt::Formatter,
    body: impl FnOnce(&T, &mut fmt::Formatter) -> fmt::Result,
) -> fmt::Result {
    let id = identity(rc);
    if FORMATTING.with(|open| open.borrow().contains(&id)) {
        return f.write_str("<cycle>");
    }
    let inner = match rc.try_borrow() {
        Ok(inner) => inner,
        Err(_) => return f.write_str("<borrowed>"),
    };
    FORMATTING.with(|open| open.borrow_mut().push(id));
    let res = body(&inner, f);
    FORMATTING.with(|open| open.borrow_mut().pop());
    res
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Number(n) => write!(f, "Value::Number({:?})", n),
            Value::BigInt(n) => write!(f, "Value::BigInt({})", n),
            Value::Str(s) => write!(f, "Value::Str({:?})", s),
            Value::Symbol(s) => fmt::Debug::fmt(s, f),
            Value::Date(ms) => write!(f, "Value::Date({})", ms),
            Value::Regex(r) => fmt::Debug::fmt(r, f),
            Value::Array(a) => fmt_shared(a, f, |a, f| f.debug_list().entries(a.iter()).finish()),
            Value::Set(s) => fmt_shared(s, f, |s, f| {
                f.write_str("Set")?;
                f.debug_set().entries(s.iter()).finish()
            }),
            Value::Map(m) => fmt_shared(m, f, |m, f| {
                f.write_str("Map")?;
                f.debug_map().entries(m.iter().map(|(k, v)| (k, v))).finish()
            }),
            Value::Record(r) => fmt_shared(r, f, |r, f| {
                f.debug_map().entries(r.iter().map(|(k, v)| (k, v))).finish()
            }),
            Value::Typed(t) => fmt_shared(t, f, |t, f| fmt::Debug::fmt(t, f)),
            Value::Instance(i) => fmt_shared(i, f, |i, f| {
                f.write_str(i.class.name())?;
                f.debug_map().entries(i.fields.iter().map(|(k, v)| (k, v))).finish()
            }),
            Value::Unsupported(u) => write!(f, "Value::Unsupported({})", u.kind()),
        }
    }
}

impl Default for Value {
    fn default() -> Value { Value::Undefined }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value { Value::Str(s.to_owned()) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Value { Value::array(v) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Value { o.map_or(Value::Null, T::into) }
}

impl From<TypedArray> for Value {
    fn from(t: TypedArray) -> Value { Value::typed(t) }
}

from_fn!(Value, bool, Value::Bool);
from_fn!(Value, f64, Value::Number);
from_fn!(Value, String, Value::Str);
from_fn!(Value, BigNum, Value::BigInt);
from_fn!(Value, Symbol, Value::Symbol);
from_fn!(Value, Regex, Value::Regex);
from_fn!(Value, Instance, Value::instance);
from_fn!(Value, Unsupported, Value::Unsupported);
from_fn!(Value, Key, Key::into_value);

// every number is a double
from_as!(Value, f32, f64);
from_as!(Value, i8, f64);
from_as!(Value, i16, f64);
from_as!(Value, i32, f64);
from_as!(Value, i64, f64);
from_as!(Value, isize, f64);
from_as!(Value, u8, f64);
from_as!(Value, u16, f64);
from_as!(Value, u32, f64);
from_as!(Value, u64, f64);
from_as!(Value, usize, f64);
