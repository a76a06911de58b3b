//! Opaque ID newtypes for IR entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and `Serialize`/`Deserialize`.
//! IDs are created by [`Arena::alloc`](crate::arena::Arena::alloc) or
//! [`TypeDb`](crate::types::TypeDb) interning and used for O(1) lookup.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a module interface in the design.
    ModuleId,
    "m"
);

define_id!(
    /// Opaque, copyable ID for a realized instance.
    InstanceId,
    "i"
);

define_id!(
    /// Opaque, copyable ID for a node in the signal graph.
    SignalId,
    "%"
);

define_id!(
    /// Opaque, copyable ID for an interned type in the [`TypeDb`](crate::types::TypeDb).
    TypeId,
    "t"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn id_roundtrip() {
        let id = InstanceId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn id_ordering_follows_allocation() {
        assert!(SignalId::from_raw(3) < SignalId::from_raw(4));
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(SignalId::from_raw(1));
        set.insert(SignalId::from_raw(2));
        set.insert(SignalId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_display_prefixes() {
        assert_eq!(SignalId::from_raw(7).to_string(), "%7");
        assert_eq!(InstanceId::from_raw(0).to_string(), "i0");
        assert_eq!(TypeId::from_raw(2).to_string(), "t2");
        assert_eq!(ModuleId::from_raw(1).to_string(), "m1");
    }
}
