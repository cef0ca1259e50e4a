//! The table of named subtrees written after the payload.

use crate::{errors::MarshalError, vecmap::VecMap, Value};
use failure::Error;

#[derive(Clone, Debug, Default, PartialEq)]
/// Names mapped to the offsets of the containers that carried them. A later
/// container with the same name replaces the earlier one.
pub(crate) struct IndexTable(VecMap<String, u32>);

impl IndexTable {
    pub(crate) fn register(&mut self, name: String, offset: u32) { self.0.insert(name, offset); }

    pub(crate) fn entries(&self) -> &VecMap<String, u32> { &self.0 }

    /// Offset registered under `name`.
    pub(crate) fn lookup(&self, name: &str) -> Result<u32, Error> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, offset)| *offset)
            .ok_or_else(|| MarshalError::IndexNotFound(name.to_owned()).into())
    }

    /// Rebuilds the table from its decoded map. Entries that are not a string
    /// name with an offset are ignored.
    pub(crate) fn from_value(value: &Value) -> IndexTable {
        let mut table = IndexTable::default();
        if let Value::Map(m) = value {
            for (k, v) in m.borrow().iter() {
                if let (Value::Str(name), Value::Number(offset)) = (k, v) {
                    if *offset >= 0.0 && *offset <= u32::max_value() as f64 {
                        table.register(name.clone(), *offset as u32);
                    }
                }
            }
        }
        table
    }
}
