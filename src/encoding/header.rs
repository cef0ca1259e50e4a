//! The header record at the start of every buffer.

use super::constants::VERSION;
use crate::{errors::MarshalError, key::Key, vecmap::VecMap, Value};
use failure::Error;

#[derive(Clone, Debug, PartialEq)]
/// Payload-wide flags. The encoder settles them once per call, and the decoder
/// trusts them for the whole payload.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let bytes = encode(&Value::from("caf\u{e9}"), EncodeOptions::default()).unwrap();
/// let header = read_header(&bytes).unwrap();
///
/// assert_eq!(header.version, "0.2.0");
/// assert!(header.ascii_only);
/// assert!(!header.has_references);
/// ```
pub struct Header {
    /// Format version of the writer.
    pub version: String,
    /// Byte order. Always little endian.
    pub big_endian: bool,
    /// The payload contains at least one reference.
    pub has_references: bool,
    /// Some key is a symbol or the index marker.
    pub has_symbol_keys: bool,
    /// Some key is a number.
    pub has_numeric_keys: bool,
    /// Every string and symbol description is at most U+00FF.
    pub ascii_only: bool,
    /// Numbers are written at the smallest width that holds them.
    pub dynamic_numbers: bool,
}

impl Default for Header {
    fn default() -> Header {
        Header {
            version: VERSION.to_owned(),
            big_endian: false,
            has_references: false,
            has_symbol_keys: false,
            has_numeric_keys: false,
            ascii_only: true,
            dynamic_numbers: false,
        }
    }
}

impl Header {
    /// Keys are plain strings, so they are read without a tag check.
    pub(crate) fn plain_keys(&self) -> bool { !self.has_symbol_keys && !self.has_numeric_keys }

    /// The header as record fields, in wire order.
    pub(crate) fn fields(&self) -> VecMap<Key, Value> {
        vec![
            (Key::from("v"), Value::from(self.version.as_str())),
            (Key::from("be"), Value::from(self.big_endian)),
            (Key::from("re"), Value::from(self.has_references)),
            (Key::from("hs"), Value::from(self.has_symbol_keys)),
            (Key::from("hn"), Value::from(self.has_numeric_keys)),
            (Key::from("aa"), Value::from(self.ascii_only)),
            (Key::from("dn"), Value::from(self.dynamic_numbers)),
        ]
        .into()
    }

    /// Reads the header from a decoded record. Unknown keys are ignored and
    /// missing ones keep their defaults.
    pub(crate) fn from_value(value: &Value) -> Result<Header, Error> {
        if !value.is_record() {
            return Err(MarshalError::BadHeader(format!("expected a record, found {}", value.kind())).into());
        }

        let flag = |key: &str, default: bool| -> Result<bool, Error> {
            match value.get(key) {
                None => Ok(default),
                Some(Value::Bool(b)) => Ok(b),
                Some(other) => Err(MarshalError::BadHeader(format!(
                    "field `{}` should be a boolean, found {}",
                    key,
                    other.kind()
                ))
                .into()),
            }
        };

        let defaults = Header::default();
        let version = match value.get("v") {
            Some(Value::Str(v)) => v,
            Some(other) => {
                return Err(MarshalError::BadHeader(format!("version should be a string, found {}", other.kind())).into())
            }
            None => return Err(MarshalError::BadHeader("missing version".to_owned()).into()),
        };

        Ok(Header {
            version,
            big_endian: flag("be", defaults.big_endian)?,
            has_references: flag("re", defaults.has_references)?,
            has_symbol_keys: flag("hs", defaults.has_symbol_keys)?,
            has_numeric_keys: flag("hn", defaults.has_numeric_keys)?,
            ascii_only: flag("aa", defaults.ascii_only)?,
            dynamic_numbers: flag("dn", defaults.dynamic_numbers)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_round_trip() {
        let header = Header {
            has_references: true,
            dynamic_numbers: true,
            ..Header::default()
        };
        let record = Value::Record(std::rc::Rc::new(std::cell::RefCell::new(header.fields())));
        assert_eq!(Header::from_value(&record).unwrap(), header);
    }

    #[test]
    fn missing_flags_default() {
        let record = Value::record(vec![("v", Value::from("0.1.0")), ("extra", Value::from(1))]);
        let header = Header::from_value(&record).unwrap();
        assert_eq!(header.version, "0.1.0");
        assert!(header.ascii_only);
        assert!(!header.has_references);
    }

    #[test]
    fn malformed() {
        let err = Header::from_value(&Value::Null).unwrap_err();
        match err.downcast_ref::<MarshalError>() {
            Some(MarshalError::BadHeader(_)) => {}
            other => panic!("unexpected error {:?}", other),
        }
        let record = Value::record(vec![("v", Value::from("0.2.0")), ("re", Value::from(1))]);
        assert!(Header::from_value(&record).is_err());
    }
}
