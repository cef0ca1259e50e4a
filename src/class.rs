//! Class tags and the registry that maps them to slots on the wire.
//!
//! An instance is written with the slot of its class rather than the class
//! itself. The encoder hands back the ordered list of classes it saw, and the
//! decoder is given a parallel list to turn slots back into classes.

use crate::{key::Key, vecmap::VecMap, Value};
use std::{fmt, ops::Deref, rc::Rc};

#[derive(Clone, PartialEq, Eq, Hash)]
/// Stable identifier of a class. Two classes with the same name are the same
/// class.
pub struct Class(Rc<str>);

impl Class {
    /// Creates a class identifier.
    pub fn new(name: &str) -> Class { Class(Rc::from(name)) }

    /// The class name.
    pub fn name(&self) -> &str { &self.0 }

    /// Creates an instance of this class holding `fields`.
    ///
    /// # Example
    ///
    /// ```
    /// use marshal::prelude::*;
    ///
    /// let point = Class::new("Point");
    /// let p = point.instantiate(vec![("x".into(), 1.into()), ("y".into(), 2.into())]);
    ///
    /// assert_eq!(p.get("x"), Some(Value::from(1)));
    /// ```
    pub fn instantiate<I: IntoIterator<Item = (Key, Value)>>(&self, fields: I) -> Value {
        Value::instance(Instance::new(self.clone(), fields.into_iter().collect()))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "Class({})", &*self.0) }
}

impl From<&str> for Class {
    fn from(name: &str) -> Class { Class::new(name) }
}

#[derive(Clone, Debug)]
/// An object tagged with its class.
pub struct Instance {
    /// The class the instance belongs to.
    pub class: Class,
    /// Fields, in insertion order.
    pub fields: VecMap<Key, Value>,
}

impl Instance {
    /// Creates an instance.
    pub fn new(class: Class, fields: VecMap<Key, Value>) -> Instance { Instance { class, fields } }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Classes in the order an encoder first met them. The position of a class is
/// its slot on the wire.
///
/// Derefs to `[Class]`, which is what the decoder takes.
///
/// # Example
///
/// ```
/// use marshal::prelude::*;
///
/// let mut reg = ClassRegistry::new();
/// let a = Class::new("A");
/// let b = Class::new("B");
///
/// assert_eq!(reg.slot_of(&a), 0);
/// assert_eq!(reg.slot_of(&b), 1);
/// assert_eq!(reg.slot_of(&a), 0);
/// assert_eq!(reg.len(), 2);
/// ```
pub struct ClassRegistry(Vec<Class>);

impl ClassRegistry {
    /// Creates an empty registry.
    pub fn new() -> ClassRegistry { ClassRegistry(Vec::new()) }

    /// Returns the slot of `class`, registering it if needed.
    pub fn slot_of(&mut self, class: &Class) -> usize {
        match self.0.iter().position(|c| c == class) {
            Some(slot) => slot,
            None => {
                self.0.push(class.clone());
                self.0.len() - 1
            }
        }
    }

    /// Consumes the registry, returning its classes.
    pub fn into_vec(self) -> Vec<Class> { self.0 }
}

impl Deref for ClassRegistry {
    type Target = [Class];

    fn deref(&self) -> &[Class] { &self.0 }
}

impl From<Vec<Class>> for ClassRegistry {
    fn from(classes: Vec<Class>) -> ClassRegistry { ClassRegistry(classes) }
}
