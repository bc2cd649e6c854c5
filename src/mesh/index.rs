//! Index types for mesh elements.
//!
//! Vertices, triangles and links live in flat arenas owned by the mesh and
//! refer to each other through these typed indices instead of references,
//! which keeps the cyclic half-edge graph free of ownership cycles.

use std::fmt::{self, Debug};

/// Sentinel raw value marking an unset index.
const INVALID: u32 = u32::MAX;

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe triangle index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TriangleId(u32);

/// A type-safe link (half-edge) index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct LinkId(u32);

/// A type-safe inclusion index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct InclusionId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            ///
            /// # Panics
            /// Panics in debug builds if the value does not fit in 32 bits.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < INVALID as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Create an invalid/null index.
            #[inline]
            pub fn invalid() -> Self {
                Self(INVALID)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(TriangleId, "T");
impl_index_type!(LinkId, "L");
impl_index_type!(InclusionId, "I");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert!(v.is_valid());

        let invalid = VertexId::invalid();
        assert!(!invalid.is_valid());
        assert_eq!(VertexId::default(), invalid);
    }

    #[test]
    fn test_type_safety() {
        let v = VertexId::new(0);
        let l = LinkId::new(0);
        let t = TriangleId::new(0);

        // Same raw value, distinct types
        assert_eq!(v.index(), l.index());
        assert_eq!(l.index(), t.index());
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", VertexId::new(42)), "V(42)");
        assert_eq!(format!("{:?}", LinkId::new(3)), "L(3)");
        assert_eq!(format!("{:?}", TriangleId::invalid()), "T(INVALID)");
        assert_eq!(format!("{}", InclusionId::new(5)), "5");
    }
}
