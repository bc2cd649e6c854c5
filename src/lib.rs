//! # Leaflet
//!
//! Turns a triangulated membrane surface into the two point clouds that
//! describe the leaflets of a lipid bilayer.
//!
//! A surface (typically a simulated membrane under periodic boundary
//! conditions) is assembled into a half-edge mesh, refined by midpoint
//! subdivision, optionally cleaned up by edge flips, and given per-vertex
//! normals, areas, principal curvatures and principal directions. Every
//! vertex is then offset by half the bilayer thickness on either side of
//! the surface.
//!
//! ## Features
//!
//! - **Periodic half-edge mesh**: typed ids, mirror links across box faces
//! - **Discrete differential geometry**: edge shape operators aggregated into
//!   per-vertex curvature tensors and local frames
//! - **Edge flips and subdivision**: all-or-nothing topology edits
//! - **File formats**: `.tsi`, `.q` and `.ply` input, point folders as output
//!
//! ## Quick Start
//!
//! ```no_run
//! use leaflet::prelude::*;
//!
//! let description = leaflet::io::load("membrane.tsi").unwrap();
//! let mesh = build_mesh(&description).unwrap();
//! let mesh = subdivide(&mesh, &SubdivideOptions::new(2)).unwrap();
//!
//! let bilayer = project(&mesh, &ProjectOptions::new(3.8)).unwrap();
//! leaflet::io::points::write_folder(&bilayer, "point").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use leaflet::prelude::*;
//! use nalgebra::Point3;
//!
//! let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
//! let positions = vec![
//!     Point3::new(1.0, 1.0, 1.0),
//!     Point3::new(2.0, 1.0, 1.0),
//!     Point3::new(1.0, 2.0, 1.0),
//!     Point3::new(1.0, 1.0, 2.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//!
//! let mut mesh = build_from_triangles(pbc, &positions, &faces).unwrap();
//! update_geometry(&mut mesh).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.euler_characteristic(), 2);
//! assert!(mesh.is_closed());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod pipeline;

/// Prelude module for convenient imports.
///
/// ```
/// use leaflet::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        flip_edge, flip_pass, project, subdivide, update_geometry, Bilayer, FlipCriterion,
        FlipOptions, Layout, ProjectOptions, SubdivideOptions,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, build_mesh, LinkId, MembraneMesh, PeriodicBox,
        SurfaceDescription, TriangleId, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron_end_to_end() {
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        let positions = vec![
            Point3::new(4.0, 4.0, 4.0),
            Point3::new(6.0, 4.0, 4.0),
            Point3::new(4.0, 6.0, 4.0),
            Point3::new(4.0, 4.0, 6.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];

        let mesh = build_from_triangles(pbc, &positions, &faces).unwrap();
        assert_eq!(mesh.num_links(), 12);
        assert!(mesh.is_valid());
        assert!(mesh.vertex_ids().all(|v| !mesh.is_boundary_vertex(v)));

        let fine = subdivide(&mesh, &SubdivideOptions::new(2)).unwrap();
        assert_eq!(fine.num_triangles(), 64);
        assert_eq!(fine.euler_characteristic(), 2);
        assert!(fine.is_valid());

        let bilayer = project(&fine, &ProjectOptions::new(0.5)).unwrap();
        assert_eq!(bilayer.outer.len(), fine.num_vertices());
        // a convex closed surface: the upper leaflet lies outside the lower one
        let centroid = Point3::new(4.5, 4.5, 4.5);
        for (up, low) in bilayer.outer.iter().zip(&bilayer.inner) {
            assert!((up.position - centroid).norm() > (low.position - centroid).norm());
        }
    }
}
