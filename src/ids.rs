//! Strongly-typed arena handles, replacing the C source's raw byte
//! offsets per spec.md §9 design note ("express this as an arena with
//! strongly-typed index handles"). Every handle is a plain index into a
//! `Vec`-backed slab (see `arena.rs`) and survives moves of the
//! surrounding collection the way an offset survives shared-memory
//! relocation — that's the property the design note asks us to keep.

use std::fmt;

macro_rules! handle {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            pub const NIL: $name = $name(u32::MAX);

            #[inline]
            pub fn is_nil(self) -> bool {
                self == Self::NIL
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

handle!(RecordId, "Handle to a record in the record arena.");
handle!(NodeId, "Handle to a T-tree node in a T-tree's node arena.");
handle!(IndexId, "Handle to an index header in the index registry.");
handle!(TemplateId, "Handle to a deduplicated index template.");
