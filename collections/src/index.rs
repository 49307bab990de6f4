//! The dense 32-bit index type shared by every repository in the crate.
//!
//! Every PDDL entity lives in an interning repository and is referred
//! to by a dense 32-bit index from 0; a sentinel `MAX_INDEX` value
//! denotes "absent". A thin `u32` newtype convertible `From`/`Into`
//! `usize`, generalised to any interned entity via the `Idx` marker
//! trait.

use std::fmt;

/// Sentinel meaning "absent" / "no binding" wherever an `Index` is used
/// as an optional reference, avoiding `Option<Index>`'s extra byte in
/// tightly packed tuples (e.g. assignment ranks, term slots).
pub const MAX_INDEX: u32 = u32::MAX;

/// A dense, zero-based index into some repository. Implementors are
/// plain `u32` newtypes; see [`define_index!`].
pub trait Idx: Copy + Eq + Ord + std::hash::Hash + fmt::Debug {
    fn from_usize(i: usize) -> Self;
    fn to_usize(self) -> usize;
    fn absent() -> Self;
    fn is_absent(self) -> bool;
}

/// Declares a dense-index newtype over `u32`, with the standard
/// conversions and an `absent()`/`is_absent()` pair backed by
/// [`MAX_INDEX`]. Used for every kind of interned PDDL entity (objects,
/// variables, predicates, atoms, actions, ...) instead of one shared
/// `Index` type, so that mixing e.g. an `ObjectIndex` where a
/// `PredicateIndex` is expected is a type error.
#[macro_export]
macro_rules! define_index {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        $vis struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(raw: u32) -> Self {
                $name(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl $crate::index::Idx for $name {
            #[inline]
            fn from_usize(i: usize) -> Self {
                debug_assert!(i < u32::MAX as usize);
                $name(i as u32)
            }
            #[inline]
            fn to_usize(self) -> usize {
                self.0 as usize
            }
            #[inline]
            fn absent() -> Self {
                $name($crate::index::MAX_INDEX)
            }
            #[inline]
            fn is_absent(self) -> bool {
                self.0 == $crate::index::MAX_INDEX
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(i: usize) -> Self {
                <$name as $crate::index::Idx>::from_usize(i)
            }
        }
        impl From<$name> for usize {
            #[inline]
            fn from(i: $name) -> Self {
                <$name as $crate::index::Idx>::to_usize(i)
            }
        }
        impl From<u32> for $name {
            #[inline]
            fn from(i: u32) -> Self {
                $name(i)
            }
        }
        impl From<$name> for u32 {
            #[inline]
            fn from(i: $name) -> Self {
                i.0
            }
        }
        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    define_index! {
        /// test-only index type
        pub struct TestIdx;
    }

    #[test]
    fn absent_round_trips() {
        assert!(TestIdx::absent().is_absent());
        assert!(!TestIdx::from_usize(0).is_absent());
    }

    #[test]
    fn usize_round_trip() {
        let i = TestIdx::from_usize(42);
        assert_eq!(i.to_usize(), 42);
    }
}
