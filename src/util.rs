//! Identity and `From` helpers.

use std::{cell::RefCell, rc::Rc};

/// Returns the identity of a shared container: the address of its allocation.
///
/// Identities are only meaningful while the container is alive, which holds for
/// the duration of a single encode call since the encoder borrows the graph.
///
/// # Example
///
/// ```
/// use marshal::util::identity;
/// use std::{cell::RefCell, rc::Rc};
///
/// let a = Rc::new(RefCell::new(vec![1]));
/// let b = a.clone();
/// let c = Rc::new(RefCell::new(vec![1]));
///
/// assert_eq!(identity(&a), identity(&b));
/// assert_ne!(identity(&a), identity(&c));
/// ```
pub fn identity<T>(rc: &Rc<RefCell<T>>) -> usize { Rc::as_ptr(rc) as *const () as usize }

/// Returns true if every character of `s` is at most U+00FF.
pub(crate) fn is_latin1(s: &str) -> bool { s.chars().all(|c| (c as u32) <= 0xFF) }

#[macro_export]
/// Helper macro to make implementing `From` easier.
macro_rules! from_fn {
    ($to:ty, $from:ty, $fn:expr) => {
        impl From<$from> for $to {
            fn from(f: $from) -> $to { $fn(f) }
        }
    };
}

#[macro_export]
/// Helper macro to make implementing `From` easier.
macro_rules! from_as {
    ($to:tt, $from:ty, $as:ty) => {
        impl From<$from> for $to {
            fn from(f: $from) -> $to { $to::from(f as $as) }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1() {
        assert!(is_latin1(""));
        assert!(is_latin1("hello"));
        assert!(is_latin1("caf\u{e9}"));
        assert!(!is_latin1("\u{1f60e}"));
        assert!(!is_latin1("\u{100}"));
    }
}
