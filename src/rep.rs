//! Conversions between Rust types and [`Value`].

use crate::{
    class::{Class, Instance},
    key::Key,
    vecmap::VecMap,
    Value,
};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// A value representable as a [`Value`].
pub trait ValueRep: Clone + Sized {
    /// Converts value into a [`Value`].
    ///
    /// # Example
    ///
    /// ```
    /// use marshal::rep::*;
    ///
    /// let v = 1u8.to_value();
    /// ```
    fn to_value(&self) -> Value { self.clone().into_value() }

    /// Consumes value, converting it into a [`Value`].
    fn into_value(self) -> Value { self.to_value() }

    /// Converts value from a [`Value`].
    ///
    /// # Example
    ///
    /// ```
    /// use marshal::rep::*;
    ///
    /// let v = "foo".to_string().into_value();
    ///
    /// assert_eq!(String::from_value(v).unwrap(), "foo");
    /// assert_eq!(u8::from_value(300.into_value()), None);
    /// ```
    fn from_value(v: Value) -> Option<Self>;
}

impl ValueRep for Value {
    fn into_value(self) -> Value { self }

    fn from_value(v: Value) -> Option<Self> { Some(v) }
}

impl ValueRep for bool {
    fn into_value(self) -> Value { Value::Bool(self) }

    fn from_value(v: Value) -> Option<Self> { v.to_bool().ok() }
}

impl ValueRep for f64 {
    fn into_value(self) -> Value { Value::Number(self) }

    fn from_value(v: Value) -> Option<Self> { v.to_number().ok() }
}

impl ValueRep for f32 {
    fn into_value(self) -> Value { Value::Number(self as f64) }

    fn from_value(v: Value) -> Option<Self> { v.to_number().ok().map(|n| n as f32) }
}

/// Integers convert from numbers holding an integral value in range, and from
/// big integers.
macro_rules! int_rep {
    ($t:ty, $to:ident) => {
        impl ValueRep for $t {
            fn into_value(self) -> Value { Value::Number(self as f64) }

            fn from_value(v: Value) -> Option<Self> {
                match v {
                    Value::Number(n) if n.fract() == 0.0 => n.$to(),
                    Value::BigInt(b) => b.$to(),
                    _ => None,
                }
            }
        }
    };
}

int_rep!(u8, to_u8);
int_rep!(u16, to_u16);
int_rep!(u32, to_u32);
int_rep!(u64, to_u64);
int_rep!(i8, to_i8);
int_rep!(i16, to_i16);
int_rep!(i32, to_i32);
int_rep!(i64, to_i64);

impl ValueRep for BigInt {
    fn into_value(self) -> Value { Value::BigInt(self) }

    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::BigInt(b) => Some(b),
            Value::Number(n) if n.fract() == 0.0 => n.to_i64().map(BigInt::from),
            _ => None,
        }
    }
}

impl ValueRep for String {
    fn into_value(self) -> Value { Value::Str(self) }

    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl<T: ValueRep> ValueRep for Vec<T> {
    fn into_value(self) -> Value { Value::array(self.into_iter().map(T::into_value)) }

    fn to_value(&self) -> Value { Value::array(self.iter().map(T::to_value)) }

    fn from_value(v: Value) -> Option<Self> {
        let elems = v.elements()?;
        let out = elems.iter().cloned().map(T::from_value).collect();
        out
    }
}

impl<T: ValueRep> ValueRep for VecMap<String, T> {
    fn to_value(&self) -> Value { Value::record(self.iter().map(|(k, v)| (k.as_str(), v.to_value()))) }

    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Record(r) => {
                let fields = r.borrow();
                let out = fields
                    .iter()
                    .map(|(k, v)| Some((k.as_str()?.to_owned(), T::from_value(v.clone())?)))
                    .collect();
                out
            }
            _ => None,
        }
    }
}

impl<T: ValueRep> ValueRep for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(x) => x.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(v: Value) -> Option<Self> {
        match v {
            Value::Null | Value::Undefined => Some(None),
            v => Some(Some(T::from_value(v)?)),
        }
    }
}

impl<A: ValueRep, B: ValueRep> ValueRep for (A, B) {
    fn into_value(self) -> Value { Value::array(vec![self.0.into_value(), self.1.into_value()]) }

    fn from_value(v: Value) -> Option<Self> {
        let (a, b) = match &v.elements()?[..] {
            [a, b] => (a.clone(), b.clone()),
            _ => return None,
        };
        Some((A::from_value(a)?, B::from_value(b)?))
    }
}

/// A Rust type that is encoded as an instance of a class.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point {
///     x: f64,
///     y: f64,
/// }
///
/// impl ClassRep for Point {
///     fn class() -> Class { Class::new("Point") }
///
///     fn to_fields(&self) -> VecMap<Key, Value> {
///         vec![(Key::from("x"), Value::from(self.x)), (Key::from("y"), Value::from(self.y))].into()
///     }
///
///     fn from_fields(fields: &VecMap<Key, Value>) -> Option<Point> {
///         Some(Point {
///             x: field(fields, "x")?,
///             y: field(fields, "y")?,
///         })
///     }
/// }
///
/// let p = Point { x: 1.0, y: 2.5 };
/// let (bytes, classes) = encode_with_type_registry(&p.to_instance(), EncodeOptions::default()).unwrap();
/// let back = Point::from_instance(&decode(&bytes, &classes).unwrap());
///
/// assert_eq!(back, Some(p));
/// ```
pub trait ClassRep: Sized {
    /// The class instances are tagged with.
    fn class() -> Class;

    /// The instance fields, in order.
    fn to_fields(&self) -> VecMap<Key, Value>;

    /// Rebuilds a value from instance fields.
    fn from_fields(fields: &VecMap<Key, Value>) -> Option<Self>;

    /// Wraps the value in an instance of [`ClassRep::class`].
    fn to_instance(&self) -> Value { Value::instance(Instance::new(Self::class(), self.to_fields())) }

    /// Rebuilds a value from an instance of [`ClassRep::class`]. Instances of
    /// other classes and anything else give `None`.
    fn from_instance(v: &Value) -> Option<Self> {
        match v {
            Value::Instance(i) => {
                let inst = i.borrow();
                if inst.class == Self::class() {
                    Self::from_fields(&inst.fields)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Reads a field and converts it.
pub fn field<T: ValueRep>(fields: &VecMap<Key, Value>, name: &str) -> Option<T> {
    T::from_value(fields.get(name)?.clone())
}
