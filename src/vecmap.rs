//! An insertion-ordered map backed by a [`Vec`] of pairs.
//!
//! Records, maps and class instances all keep their entries in the order they
//! were inserted, and that order is part of the wire format. Lookups are linear,
//! which is fine for the field counts these containers usually have.
//!
//! # Example
//!
//! ```
//! use marshal::prelude::*;
//!
//! let mut vmap = VecMap::new();
//! vmap.insert("b", 1);
//! vmap.insert("a", 2);
//!
//! // insertion order, not key order
//! let keys: Vec<_> = vmap.keys().cloned().collect();
//! assert_eq!(keys, vec!["b", "a"]);
//!
//! // re-inserting keeps the original position
//! vmap.insert("b", 3);
//! assert_eq!(vmap.iter().next(), Some(&("b", 3)));
//! ```

use std::{
    iter::FromIterator,
    slice::{Iter, IterMut},
    vec::IntoIter,
};

#[derive(Clone, Debug, Default)]
/// A map implemented as an insertion-ordered [`Vec`] of pairs with unique keys.
///
/// See also: [module level documentation](`crate::vecmap`).
pub struct VecMap<K, V>(Vec<(K, V)>);

impl<K, V> VecMap<K, V> {
    /// Creates an empty [`VecMap`].
    pub fn new() -> Self { VecMap(Vec::new()) }

    /// Creates an empty [`VecMap`] with room for `cap` entries.
    pub fn with_capacity(cap: usize) -> Self { VecMap(Vec::with_capacity(cap)) }

    /// Returns length.
    ///
    /// # Example
    ///
    /// ```
    /// use marshal::prelude::*;
    ///
    /// let vmap: VecMap<_, _> = vec![("foo", "bar")].into_iter().collect();
    ///
    /// assert_eq!(vmap.len(), 1);
    /// ```
    pub fn len(&self) -> usize { self.0.len() }

    /// Indicates whether the [`VecMap`] is empty.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Returns an [`Iter`] of the key value pairs, in insertion order.
    pub fn iter(&self) -> Iter<(K, V)> { self.0.iter() }

    /// Returns an [`IterMut`] of the key value pairs, in insertion order.
    pub fn iter_mut(&mut self) -> IterMut<(K, V)> { self.0.iter_mut() }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> { self.0.iter().map(|(k, _)| k) }

    /// Returns an iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = &V> { self.0.iter().map(|(_, v)| v) }

    /// Appends a pair without checking for an existing key.
    ///
    /// Callers must guarantee uniqueness; the decoder uses this because the
    /// encoder never writes duplicate keys.
    pub(crate) fn push_unchecked(&mut self, k: K, v: V) { self.0.push((k, v)) }

    /// Mutable access to the value at position `i`.
    pub(crate) fn value_at_mut(&mut self, i: usize) -> Option<&mut V> {
        self.0.get_mut(i).map(|(_, v)| v)
    }
}

impl<K: PartialEq, V> VecMap<K, V> {
    /// Inserts a pair. If the key is already present its value is replaced in
    /// place and the old value returned, so the entry keeps its position.
    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        match self.0.iter_mut().find(|(key, _)| *key == k) {
            Some((_, slot)) => Some(std::mem::replace(slot, v)),
            None => {
                self.0.push((k, v));
                None
            }
        }
    }

    /// Returns the value stored under `k`.
    pub fn get<Q: ?Sized>(&self, k: &Q) -> Option<&V>
    where
        K: PartialEq<Q>,
    {
        self.0.iter().find(|(key, _)| key == k).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value stored under `k`.
    pub fn get_mut<Q: ?Sized>(&mut self, k: &Q) -> Option<&mut V>
    where
        K: PartialEq<Q>,
    {
        self.0.iter_mut().find(|(key, _)| key == k).map(|(_, v)| v)
    }

    /// Indicates whether `k` is present.
    pub fn contains_key<Q: ?Sized>(&self, k: &Q) -> bool
    where
        K: PartialEq<Q>,
    {
        self.get(k).is_some()
    }

    /// Removes `k`, preserving the order of the remaining entries.
    pub fn remove<Q: ?Sized>(&mut self, k: &Q) -> Option<V>
    where
        K: PartialEq<Q>,
    {
        let pos = self.0.iter().position(|(key, _)| key == k)?;
        Some(self.0.remove(pos).1)
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for VecMap<K, V> {
    fn eq(&self, other: &Self) -> bool { self.0 == other.0 }
}

impl<K, V> IntoIterator for VecMap<K, V> {
    type IntoIter = IntoIter<(K, V)>;
    type Item = (K, V);

    fn into_iter(self) -> IntoIter<(K, V)> { self.0.into_iter() }
}

impl<'a, K, V> IntoIterator for &'a VecMap<K, V> {
    type IntoIter = Iter<'a, (K, V)>;
    type Item = &'a (K, V);

    fn into_iter(self) -> Iter<'a, (K, V)> { self.0.iter() }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for VecMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> VecMap<K, V> {
        let mut out = VecMap::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

impl<K: PartialEq, V> From<Vec<(K, V)>> for VecMap<K, V> {
    fn from(v: Vec<(K, V)>) -> Self { Self::from_iter(v) }
}
