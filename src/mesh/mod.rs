//! Core mesh data structures.
//!
//! # Overview
//!
//! The primary type is [`MembraneMesh`], a triangle mesh inside a
//! [`PeriodicBox`] stored as three flat arenas: [`Vertex`], [`Triangle`] and
//! [`Link`] (half-edge). Elements refer to each other through type-safe
//! indices ([`VertexId`], [`TriangleId`], [`LinkId`]), never through
//! references, so the cyclic half-edge graph has a single owner.
//!
//! # Construction
//!
//! Meshes are built from a [`SurfaceDescription`] produced by a reader, or
//! directly from face-vertex lists:
//!
//! ```
//! use leaflet::mesh::{build_from_triangles, PeriodicBox};
//! use nalgebra::Point3;
//!
//! let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
//! let vertices = vec![
//!     Point3::new(1.0, 1.0, 5.0),
//!     Point3::new(2.0, 1.0, 5.0),
//!     Point3::new(1.5, 2.0, 5.0),
//! ];
//! let mesh = build_from_triangles(pbc, &vertices, &[[0, 1, 2]]).unwrap();
//! assert!(mesh.is_valid());
//! ```
//!
//! Cached geometry (normals, areas, curvature) is empty until
//! [`crate::algo::update_geometry`] runs.

mod builder;
mod inclusion;
mod index;
mod link;
mod pbc;
mod surface;
mod triangle;
mod vertex;

pub use builder::{
    build_from_triangles, build_mesh, to_face_vertex, ExclusionRecord, InclusionRecord,
    SurfaceDescription, TriangleRecord, VertexRecord,
};
pub use inclusion::{Exclusion, Inclusion};
pub use index::{InclusionId, LinkId, TriangleId, VertexId};
pub use link::{edge_shape, EdgeShape, Link, LinkKind, DIHEDRAL_NOISE_LIMIT};
pub use pbc::PeriodicBox;
pub use surface::MembraneMesh;
pub use triangle::Triangle;
pub use vertex::Vertex;

pub(crate) use builder::{add_inclusion, assemble};
pub(crate) use triangle::{area_vector, corner_angle};
