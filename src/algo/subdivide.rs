//! Periodic midpoint subdivision.
//!
//! Each iteration splits every triangle into four by inserting one vertex at
//! the periodic midpoint of every edge:
//!
//! ```text
//!          v2                     v2
//!         /  \                   /  \
//!        /    \                e20---e12
//!       /      \      =>       / \   / \
//!      /        \             /   \ /   \
//!    v0 -------- v1         v0 ---e01--- v1
//! ```
//!
//! Positions are not smoothed: the refined surface is piecewise identical to
//! the input. Normals, areas and curvature are recomputed on the new
//! generation, never interpolated.
//!
//! # Cost
//!
//! One iteration turns `(V, E, T)` into `(V + E, 2E + 3T, 4T)`, so `n`
//! iterations grow the vertex count roughly by `4^n`. Use
//! [`SubdivideOptions::estimate`] to check the size before running.
//!
//! # Example
//!
//! ```
//! use leaflet::algo::{subdivide, update_geometry, SubdivideOptions};
//! use leaflet::mesh::{build_from_triangles, PeriodicBox};
//! use nalgebra::Point3;
//!
//! let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
//! let positions = vec![
//!     Point3::new(1.0, 1.0, 5.0),
//!     Point3::new(3.0, 1.0, 5.0),
//!     Point3::new(1.0, 3.0, 5.0),
//! ];
//! let mesh = build_from_triangles(pbc, &positions, &[[0, 1, 2]]).unwrap();
//!
//! let refined = subdivide(&mesh, &SubdivideOptions::new(2)).unwrap();
//! assert_eq!(refined.num_triangles(), 16);
//! assert_eq!(refined.num_vertices(), 15);
//! ```

use std::collections::HashMap;

use log::{debug, info};

use super::geometry::update_geometry;
use super::progress::Progress;
use crate::error::Result;
use crate::mesh::{add_inclusion, assemble, MembraneMesh, Vertex, VertexId};

/// Options for subdivision.
#[derive(Debug, Clone)]
pub struct SubdivideOptions {
    /// Number of subdivision iterations.
    pub iterations: usize,
}

impl Default for SubdivideOptions {
    fn default() -> Self {
        Self { iterations: 1 }
    }
}

impl SubdivideOptions {
    /// Create options with the specified number of iterations.
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Element counts after running these options on `mesh`.
    pub fn estimate(&self, mesh: &MembraneMesh) -> SizeEstimate {
        let mut est = SizeEstimate {
            vertices: mesh.num_vertices(),
            edges: mesh.num_edges(),
            triangles: mesh.num_triangles(),
        };
        for _ in 0..self.iterations {
            est = SizeEstimate {
                vertices: est.vertices.saturating_add(est.edges),
                edges: est
                    .edges
                    .saturating_mul(2)
                    .saturating_add(est.triangles.saturating_mul(3)),
                triangles: est.triangles.saturating_mul(4),
            };
        }
        est
    }
}

/// Element counts of a mesh generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimate {
    /// Vertex count.
    pub vertices: usize,
    /// Undirected edge count.
    pub edges: usize,
    /// Triangle count.
    pub triangles: usize,
}

/// Subdivide `options.iterations` times and run the geometry pass on the
/// result.
///
/// With zero iterations this returns a copy with refreshed geometry.
pub fn subdivide(mesh: &MembraneMesh, options: &SubdivideOptions) -> Result<MembraneMesh> {
    subdivide_with_progress(mesh, options, &Progress::none())
}

/// Subdivision with progress reporting.
pub fn subdivide_with_progress(
    mesh: &MembraneMesh,
    options: &SubdivideOptions,
    progress: &Progress,
) -> Result<MembraneMesh> {
    let target = options.estimate(mesh);
    if options.iterations > 0 {
        info!(
            "subdividing {} times: {} -> {} vertices, {} -> {} triangles",
            options.iterations,
            mesh.num_vertices(),
            target.vertices,
            mesh.num_triangles(),
            target.triangles
        );
    }

    let mut current = mesh.clone();
    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, "Subdividing");
        current = subdivide_once(&current)?;
        update_geometry(&mut current)?;
        debug!(
            "iteration {}: {} vertices, {} triangles",
            iter + 1,
            current.num_vertices(),
            current.num_triangles()
        );
    }
    if options.iterations == 0 {
        update_geometry(&mut current)?;
    }
    progress.report(options.iterations, options.iterations, "Subdividing");
    Ok(current)
}

/// Split every triangle into four. Geometry of the result is not computed.
///
/// Existing vertices keep their ids. The midpoint of the `k`-th distinct edge
/// (in order of first appearance while walking the triangles) gets id
/// `V + k` and the domain of the lower-id endpoint.
pub fn subdivide_once(mesh: &MembraneMesh) -> Result<MembraneMesh> {
    let pbc = *mesh.pbc();
    let nv = mesh.num_vertices();

    let mut vertices: Vec<Vertex> = mesh
        .vertices()
        .map(|(_, v)| Vertex::new(*v.position(), v.domain()))
        .collect();
    vertices.reserve(mesh.num_edges());

    let mut midpoints: HashMap<(usize, usize), usize> = HashMap::with_capacity(mesh.num_edges());
    let mut faces = Vec::with_capacity(mesh.num_triangles() * 4);

    for (_, tri) in mesh.triangles() {
        let corners = tri.vertices().map(VertexId::index);
        let mut mids = [0usize; 3];

        for k in 0..3 {
            let a = corners[k];
            let b = corners[(k + 1) % 3];
            let key = (a.min(b), a.max(b));
            mids[k] = *midpoints.entry(key).or_insert_with(|| {
                let p = pbc.midpoint(mesh.position(VertexId::new(a)), mesh.position(VertexId::new(b)));
                let domain = mesh.vertex(VertexId::new(key.0)).domain();
                vertices.push(Vertex::new(p, domain));
                vertices.len() - 1
            });
        }

        let [v0, v1, v2] = corners;
        let [e01, e12, e20] = mids;
        faces.push([v0, e01, e20]);
        faces.push([v1, e12, e01]);
        faces.push([v2, e20, e12]);
        faces.push([e01, e12, e20]);
    }
    debug_assert_eq!(vertices.len(), nv + midpoints.len());

    let mut refined = assemble(pbc, vertices, &faces)?;
    for inclusion in mesh.inclusions() {
        add_inclusion(&mut refined, inclusion.clone())?;
    }
    refined.exclusions = mesh.exclusions().to_vec();
    Ok(refined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::geometry::tests::{flat_sheet, icosphere};
    use crate::mesh::{build_mesh, InclusionId, PeriodicBox, SurfaceDescription, TriangleRecord, VertexRecord};
    use crate::mesh::{ExclusionRecord, InclusionRecord};
    use nalgebra::{Point3, Vector2};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_counts_closed_sphere() {
        let mesh = icosphere(1, 1.0);
        let (v, e, t) = (mesh.num_vertices(), mesh.num_edges(), mesh.num_triangles());

        let refined = subdivide_once(&mesh).unwrap();
        assert_eq!(refined.num_triangles(), 4 * t);
        assert_eq!(refined.num_vertices(), v + e);
        assert_eq!(refined.num_edges(), 2 * e + 3 * t);
        assert_eq!(refined.euler_characteristic(), 2);
        assert!(refined.is_valid());
    }

    #[test]
    fn test_counts_periodic_sheet() {
        let mesh = flat_sheet(4, 5.0);
        let refined = subdivide(&mesh, &SubdivideOptions::new(2)).unwrap();
        assert_eq!(refined.num_triangles(), 32 * 16);
        assert_eq!(refined.num_vertices(), 16 * 16);
        assert!(refined.is_closed());
        assert_eq!(refined.euler_characteristic(), 0);
        assert!((refined.surface_area() - 16.0).abs() < 1e-9);
        for (_, v) in refined.vertices() {
            assert!((v.area() - 1.0 / 16.0).abs() < 1e-12);
            assert!(v.curvature().0.abs() < 1e-9);
        }
    }

    #[test]
    fn test_estimate_matches() {
        let mesh = icosphere(0, 1.0);
        let options = SubdivideOptions::new(3);
        let est = options.estimate(&mesh);
        let refined = subdivide(&mesh, &options).unwrap();
        assert_eq!(est.vertices, refined.num_vertices());
        assert_eq!(est.edges, refined.num_edges());
        assert_eq!(est.triangles, refined.num_triangles());
    }

    #[test]
    fn test_existing_ids_are_stable() {
        let mesh = icosphere(1, 1.0);
        let refined = subdivide_once(&mesh).unwrap();
        for (id, v) in mesh.vertices() {
            assert_eq!(refined.position(id), v.position());
        }
    }

    #[test]
    fn test_midpoints_across_the_box() {
        // One triangle straddling x = 0
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        let desc = SurfaceDescription::new(
            pbc,
            vec![
                VertexRecord { id: 0, position: Point3::new(9.0, 1.0, 5.0), domain: 1 },
                VertexRecord { id: 1, position: Point3::new(1.0, 1.0, 5.0), domain: 2 },
                VertexRecord { id: 2, position: Point3::new(9.0, 3.0, 5.0), domain: 3 },
            ],
            vec![TriangleRecord { id: 0, vertices: [0, 1, 2] }],
        );
        let mesh = build_mesh(&desc).unwrap();
        let refined = subdivide(&mesh, &SubdivideOptions::new(1)).unwrap();

        // First edge seen is (0, 1)
        let m = refined.vertex(VertexId::new(3));
        assert!(m.position().x.abs() < 1e-12 || (m.position().x - 10.0).abs() < 1e-12);
        assert_eq!(m.domain(), 1);
        // Total area is preserved: the parent triangle has area 2
        assert!((refined.surface_area() - 2.0).abs() < 1e-9);
        for (_, l) in refined.links() {
            assert!(l.edge_length() < 2.0);
        }
    }

    #[test]
    fn test_records_follow_vertices() {
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        let mut desc = SurfaceDescription::new(
            pbc,
            vec![
                VertexRecord { id: 5, position: Point3::new(1.0, 1.0, 5.0), domain: 0 },
                VertexRecord { id: 6, position: Point3::new(3.0, 1.0, 5.0), domain: 0 },
                VertexRecord { id: 7, position: Point3::new(1.0, 3.0, 5.0), domain: 0 },
            ],
            vec![TriangleRecord { id: 0, vertices: [5, 6, 7] }],
        );
        desc.inclusions.push(InclusionRecord {
            id: 0,
            type_id: 4,
            vertex: 7,
            direction: Vector2::new(1.0, 0.0),
        });
        desc.exclusions.push(ExclusionRecord { id: 0, vertex: 6, radius: 2.0 });
        let mesh = build_mesh(&desc).unwrap();

        let refined = subdivide(&mesh, &SubdivideOptions::new(2)).unwrap();
        assert_eq!(refined.inclusions().len(), 1);
        assert_eq!(refined.inclusion(InclusionId::new(0)).vertex(), VertexId::new(2));
        assert_eq!(refined.vertex(VertexId::new(2)).inclusion(), Some(InclusionId::new(0)));
        assert_eq!(refined.exclusions()[0].vertex(), VertexId::new(1));
    }

    #[test]
    fn test_progress_reports() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let progress = Progress::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mesh = flat_sheet(3, 5.0);
        subdivide_with_progress(&mesh, &SubdivideOptions::new(2), &progress).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
