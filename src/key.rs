//! Symbols and the keys of records, maps and class instances.

use crate::{from_fn, Value};
use std::{fmt, rc::Rc};

/// Description carried by the index-marker symbol.
pub const INDEX_DESCRIPTION: &str = "Marshal.index";

thread_local! {
    static INDEX: Symbol = Symbol::new(INDEX_DESCRIPTION);
}

#[derive(Clone)]
/// A named value that is only ever equal to itself.
///
/// Two symbols with the same description are still distinct; clones of one
/// symbol are equal.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let a = Symbol::new("tag");
/// let b = Symbol::new("tag");
///
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// assert_eq!(a.description(), "tag");
/// ```
pub struct Symbol(Rc<str>);

impl Symbol {
    /// Creates a fresh symbol.
    pub fn new(description: &str) -> Symbol { Symbol(Rc::from(description)) }

    /// The symbol's description.
    pub fn description(&self) -> &str { &self.0 }

    /// The index marker. A record, map or instance holding this key with a
    /// string value is registered in the index table under that string, and can
    /// then be read back with [`decode_by_index_name`](crate::encoding::decode_by_index_name).
    ///
    /// The marker is per thread; values are `!Send` so they never observe
    /// another thread's marker.
    pub fn index() -> Symbol { INDEX.with(Symbol::clone) }

    /// Indicates whether this is the index marker.
    pub fn is_index(&self) -> bool { INDEX.with(|idx| *self == *idx) }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Symbol) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "Symbol({:?})", &*self.0) }
}

#[derive(Clone, Debug)]
/// Key of a record or class instance field.
pub enum Key {
    /// String key.
    Str(String),
    /// Numeric key.
    Number(f64),
    /// Symbol key.
    Symbol(Symbol),
}

impl Key {
    /// Indicates whether this is a string key.
    pub fn is_str(&self) -> bool {
        match self {
            Key::Str(_) => true,
            _ => false,
        }
    }

    /// Indicates whether this is the index marker.
    pub fn is_index(&self) -> bool {
        match self {
            Key::Symbol(s) => s.is_index(),
            _ => false,
        }
    }

    /// Returns the string if this is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the key into the value it represents as a map key.
    pub fn into_value(self) -> Value {
        match self {
            Key::Str(s) => Value::Str(s),
            Key::Number(n) => Value::Number(n),
            Key::Symbol(s) => Value::Symbol(s),
        }
    }
}

/// Number equality where `NaN` equals itself and `0.0` equals `-0.0`.
pub(crate) fn same_value_zero(a: f64, b: f64) -> bool { a == b || (a.is_nan() && b.is_nan()) }

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        match (self, other) {
            (Key::Str(a), Key::Str(b)) => a == b,
            (Key::Number(a), Key::Number(b)) => same_value_zero(*a, *b),
            (Key::Symbol(a), Key::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool { self.as_str() == Some(other) }
}

impl<'a> PartialEq<&'a str> for Key {
    fn eq(&self, other: &&'a str) -> bool { self.as_str() == Some(*other) }
}

from_fn!(Key, String, Key::Str);
from_fn!(Key, &str, |s: &str| Key::Str(s.to_owned()));
from_fn!(Key, f64, Key::Number);
from_fn!(Key, Symbol, Key::Symbol);
