//! Edge flips.
//!
//! A flip replaces the diagonal of the quad formed by two triangles sharing
//! an interior edge:
//!
//! ```text
//!        v3                    v3
//!       /  \                  /|\
//!      / T1 \                / | \
//!    v1 ---> v2    =>      v1 T1|T2 v2
//!      \ T2 /                \ | /
//!       \  /                  \|/
//!        v4                    v4
//! ```
//!
//! Link and triangle ids survive the flip; only their vertices and
//! neighbour references change.

use std::f64::consts::PI;

use log::debug;
use nalgebra::{Point3, Vector3};

use super::geometry::{refresh_edge, update_geometry};
use crate::error::{MeshError, Result};
use crate::mesh::{area_vector, corner_angle, LinkId, MembraneMesh, VertexId};

/// Slack on the opposite-angle sum before a Delaunay flip is taken.
const DELAUNAY_EPS: f64 = 1e-9;

/// Which edges a flip pass flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipCriterion {
    /// Flip when the two angles opposite the edge sum to more than π.
    #[default]
    Delaunay,
    /// Flip when it brings vertex valences closer to 6 (4 on the boundary).
    Valence,
}

/// Options for [`flip_pass`].
#[derive(Debug, Clone)]
pub struct FlipOptions {
    /// Flip criterion.
    pub criterion: FlipCriterion,
    /// Maximum number of sweeps over all edges.
    pub max_sweeps: usize,
}

impl Default for FlipOptions {
    fn default() -> Self {
        Self {
            criterion: FlipCriterion::Delaunay,
            max_sweeps: 50,
        }
    }
}

impl FlipOptions {
    /// Create options with the given criterion.
    pub fn new(criterion: FlipCriterion) -> Self {
        Self {
            criterion,
            ..Default::default()
        }
    }

    /// Set the sweep limit.
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }
}

/// The six links and four vertices around a flippable edge.
struct FlipQuad {
    l: LinkId,
    m: LinkId,
    l1: LinkId,
    l2: LinkId,
    l3: LinkId,
    l4: LinkId,
    v1: VertexId,
    v2: VertexId,
    v3: VertexId,
    v4: VertexId,
}

/// Collect the quad around `l`, checking that a flip is possible.
fn flip_quad(mesh: &MembraneMesh, l: LinkId) -> Result<FlipQuad> {
    if l.index() >= mesh.num_links() {
        return Err(MeshError::invalid_param("link", l, "out of range"));
    }
    let m = mesh
        .mirror(l)
        .ok_or(MeshError::BoundaryFlip { link: l.index() })?;

    let link = mesh.link(l);
    let (v1, v2, v3) = (link.v1(), link.v2(), link.v3());
    let v4 = mesh.link(m).v3();

    if v3 == v4 || mesh.vertex(v3).neighbors().contains(&v4) {
        return Err(MeshError::FlipCreatesDuplicateEdge {
            link: l.index(),
            v0: v3.index(),
            v1: v4.index(),
        });
    }

    Ok(FlipQuad {
        l,
        m,
        l1: mesh.next(l),
        l2: mesh.prev(l),
        l3: mesh.next(m),
        l4: mesh.prev(m),
        v1,
        v2,
        v3,
        v4,
    })
}

/// Flip an interior edge.
///
/// With `T1 = (v1, v2, v3)` owning `l = v1 -> v2` and `T2 = (v2, v1, v4)`
/// owning its mirror, the result is `T1 = (v4, v3, v1)` owning `l = v4 -> v3`
/// and `T2 = (v3, v4, v2)` owning the mirror `v3 -> v4`.
///
/// Both triangles' normals and areas and the flipped edge vectors are
/// refreshed; shape operators and vertex curvature stay stale until the next
/// [`update_geometry`].
///
/// # Errors
/// Fails before touching the mesh when `l` is out of range, when `l` is a
/// boundary link ([`MeshError::BoundaryFlip`]), when `v3` and `v4` are already
/// connected ([`MeshError::FlipCreatesDuplicateEdge`]), or when a new triangle
/// would be degenerate.
pub fn flip_edge(mesh: &mut MembraneMesh, l: LinkId) -> Result<()> {
    let q = flip_quad(mesh, l)?;
    let t1 = mesh.link(q.l).triangle();
    let t2 = mesh.link(q.m).triangle();

    let pbc = *mesh.pbc();
    let a1 = area_vector(&pbc, [mesh.position(q.v4), mesh.position(q.v3), mesh.position(q.v1)]);
    let a2 = area_vector(&pbc, [mesh.position(q.v3), mesh.position(q.v4), mesh.position(q.v2)]);
    for (t, a) in [(t1, &a1), (t2, &a2)] {
        let n = a.norm();
        if n == 0.0 || !n.is_finite() {
            return Err(MeshError::DegenerateTriangle { triangle: t.index() });
        }
    }

    // T1 = (v4, v3, v1): l -> l2 -> l3
    rewire(mesh, q.l, q.v4, q.v3, q.v1, q.l2, q.l3);
    rewire(mesh, q.l2, q.v3, q.v1, q.v4, q.l3, q.l);
    rewire(mesh, q.l3, q.v1, q.v4, q.v3, q.l, q.l2);
    // T2 = (v3, v4, v2): m -> l4 -> l1
    rewire(mesh, q.m, q.v3, q.v4, q.v2, q.l4, q.l1);
    rewire(mesh, q.l4, q.v4, q.v2, q.v3, q.l1, q.m);
    rewire(mesh, q.l1, q.v2, q.v3, q.v4, q.m, q.l4);
    for &x in &[q.l, q.l2, q.l3] {
        mesh.links[x.index()].triangle = t1;
    }
    for &x in &[q.m, q.l4, q.l1] {
        mesh.links[x.index()].triangle = t2;
    }

    let tri1 = &mut mesh.triangles[t1.index()];
    tri1.vertices = [q.v4, q.v3, q.v1];
    tri1.normal = a1.normalize();
    tri1.area = 0.5 * a1.norm();
    let tri2 = &mut mesh.triangles[t2.index()];
    tri2.vertices = [q.v3, q.v4, q.v2];
    tri2.normal = a2.normalize();
    tri2.area = 0.5 * a2.norm();

    let vs = &mut mesh.vertices;
    vs[q.v1.index()].remove_neighbor(q.v2);
    vs[q.v1.index()].remove_link(q.l);
    vs[q.v1.index()].remove_triangle(t2);
    vs[q.v2.index()].remove_neighbor(q.v1);
    vs[q.v2.index()].remove_link(q.m);
    vs[q.v2.index()].remove_triangle(t1);
    vs[q.v3.index()].add_neighbor(q.v4);
    vs[q.v3.index()].add_link(q.m);
    vs[q.v3.index()].add_triangle(t2);
    vs[q.v4.index()].add_neighbor(q.v3);
    vs[q.v4.index()].add_link(q.l);
    vs[q.v4.index()].add_triangle(t1);

    refresh_edge(mesh, q.l);
    Ok(())
}

fn rewire(
    mesh: &mut MembraneMesh,
    l: LinkId,
    v1: VertexId,
    v2: VertexId,
    v3: VertexId,
    next: LinkId,
    prev: LinkId,
) {
    let link = &mut mesh.links[l.index()];
    link.v1 = v1;
    link.v2 = v2;
    link.v3 = v3;
    link.neighbor1 = next;
    link.neighbor2 = prev;
}

/// Flip edges until none qualifies or the sweep limit is hit, then rerun the
/// geometry pass.
///
/// Returns the number of flips. Boundary links are never touched.
pub fn flip_pass(mesh: &mut MembraneMesh, options: &FlipOptions) -> Result<usize> {
    let mut total = 0;
    for sweep in 0..options.max_sweeps {
        let mut flipped = 0;
        for i in 0..mesh.num_links() {
            let l = LinkId::new(i);
            match mesh.mirror(l) {
                Some(m) if m > l => {}
                _ => continue,
            }
            if should_flip(mesh, l, options.criterion) {
                match flip_edge(mesh, l) {
                    Ok(()) => flipped += 1,
                    Err(MeshError::FlipCreatesDuplicateEdge { .. })
                    | Err(MeshError::DegenerateTriangle { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        debug!("flip sweep {}: {} flips", sweep, flipped);
        total += flipped;
        if flipped == 0 {
            break;
        }
    }
    update_geometry(mesh)?;
    Ok(total)
}

fn should_flip(mesh: &MembraneMesh, l: LinkId, criterion: FlipCriterion) -> bool {
    let q = match flip_quad(mesh, l) {
        Ok(q) => q,
        Err(_) => return false,
    };
    if !is_convex_quad(mesh, [q.v1, q.v4, q.v2, q.v3]) {
        return false;
    }

    match criterion {
        FlipCriterion::Delaunay => {
            let pbc = mesh.pbc();
            let (p1, p2) = (mesh.position(q.v1), mesh.position(q.v2));
            let alpha = corner_angle(pbc, mesh.position(q.v3), p1, p2);
            let beta = corner_angle(pbc, mesh.position(q.v4), p2, p1);
            alpha + beta > PI + DELAUNAY_EPS
        }
        FlipCriterion::Valence => {
            let deviation = |v: VertexId, delta: i64| {
                let target = if mesh.is_boundary_vertex(v) { 4 } else { 6 };
                (mesh.vertex(v).valence() as i64 + delta - target).abs()
            };
            let before = deviation(q.v1, 0) + deviation(q.v2, 0) + deviation(q.v3, 0) + deviation(q.v4, 0);
            let after = deviation(q.v1, -1) + deviation(q.v2, -1) + deviation(q.v3, 1) + deviation(q.v4, 1);
            after < before
        }
    }
}

/// Whether the quad `(a, b, c, d)` is convex, with periodic edges.
fn is_convex_quad(mesh: &MembraneMesh, quad: [VertexId; 4]) -> bool {
    // Unwrap around the first corner
    let origin = mesh.position(quad[0]);
    let pts: Vec<Point3<f64>> = quad
        .iter()
        .map(|&v| origin + mesh.pbc().displacement(origin, mesh.position(v)))
        .collect();

    let corner_normal = |i: usize| -> Vector3<f64> {
        let prev = pts[(i + 3) % 4];
        let cur = pts[i];
        let next = pts[(i + 1) % 4];
        (next - cur).cross(&(prev - cur))
    };
    let n: Vec<Vector3<f64>> = (0..4).map(corner_normal).collect();
    n[0].dot(&n[1]) > 0.0 && n[1].dot(&n[2]) > 0.0 && n[2].dot(&n[3]) > 0.0
}
