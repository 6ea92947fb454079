//! Type-safe index wrappers
//!
//! Newtypes around `u32` so atom and bond indices cannot be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $debug_name:literal
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create a new index
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            /// Get the raw index value as usize
            #[inline]
            pub const fn as_usize(&self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $debug_name, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                $name(index as u32)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(index: $name) -> Self {
                index.0 as usize
            }
        }
    };
}

define_index!(
    /// Type-safe index into a molecule's atom array
    AtomIndex, "AtomIndex"
);

define_index!(
    /// Type-safe index into a molecule's bond array
    BondIndex, "BondIndex"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_conversions() {
        let idx = AtomIndex::from(7usize);
        assert_eq!(idx.as_usize(), 7);
        assert_eq!(usize::from(idx), 7);
        assert_eq!(format!("{:?}", idx), "AtomIndex(7)");
        assert_eq!(format!("{}", BondIndex::new(3)), "3");
    }
}
