//! Surface algorithms.
//!
//! - **Geometry**: triangle normals and areas, edge shape operators, vertex
//!   normals, areas, principal curvatures and local frames
//! - **Flip**: single edge flips and Delaunay or valence driven flip passes
//! - **Subdivision**: periodic midpoint subdivision
//! - **Projection**: leaflet point sets offset along the vertex normals
//!
//! Topological operations leave geometry stale; call [`update_geometry`]
//! before reading curvature or projecting.

pub mod flip;
pub mod geometry;
pub mod progress;
pub mod project;
pub mod subdivide;

pub use flip::{flip_edge, flip_pass, FlipCriterion, FlipOptions};
pub use geometry::update_geometry;
pub use progress::Progress;
pub use project::{
    project, Bilayer, LeafletPoint, Layout, PointExclusion, PointInclusion, ProjectOptions,
};
pub use subdivide::{
    subdivide, subdivide_once, subdivide_with_progress, SizeEstimate, SubdivideOptions,
};
