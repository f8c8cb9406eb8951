//! Opaque ID newtypes for netlist and clustering entities.
//!
//! [`BlockId`], [`NetId`], and [`ClusterId`] are thin `u32` wrappers used
//! as arena indices into the netlist and the cluster tables. They are `Copy`,
//! `Hash`, `Ord`, and `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Creates an ID from a `usize` arena position.
            pub fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the ID as a `usize`, for indexing parallel arrays.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a block (LUT, latch or pad) in the netlist.
    BlockId
);

define_id!(
    /// Opaque, copyable ID for a net in the netlist.
    NetId
);

define_id!(
    /// Opaque, copyable ID for a cluster produced by packing.
    ClusterId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn index_matches_raw() {
        let id = BlockId::from_index(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn ids_order_by_index() {
        let mut ids = vec![NetId::from_raw(7), NetId::from_raw(2), NetId::from_raw(5)];
        ids.sort();
        assert_eq!(ids, vec![NetId::from_raw(2), NetId::from_raw(5), NetId::from_raw(7)]);
    }

    #[test]
    fn id_hash_dedup() {
        let mut set = HashSet::new();
        set.insert(ClusterId::from_raw(1));
        set.insert(ClusterId::from_raw(1));
        set.insert(ClusterId::from_raw(2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", BlockId::from_raw(12)), "12");
    }

    #[test]
    fn serde_is_transparent_number() {
        let json = serde_json::to_string(&ClusterId::from_raw(3)).unwrap();
        assert_eq!(json, "3");
    }
}
