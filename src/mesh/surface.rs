//! The membrane mesh: arenas of vertices, triangles and links.
//!
//! # Structure
//!
//! - Every triangle owns three **links** `v1 -> v2` chained by `neighbor1`
//!   (next) and `neighbor2` (previous)
//! - Interior edges carry two links pointing at each other through `mirror`
//! - Boundary edges carry one unmirrored link of kind [`LinkKind::Boundary`]
//! - Each vertex lists its outgoing links, incident triangles and neighbours
//!
//! One `MembraneMesh` is one generation: subdivision builds a new one and the
//! old value is dropped whole.

use nalgebra::{Point3, Vector3};

use super::inclusion::{Exclusion, Inclusion};
use super::index::{InclusionId, LinkId, TriangleId, VertexId};
use super::link::{Link, LinkKind};
use super::pbc::PeriodicBox;
use super::triangle::Triangle;
use super::vertex::Vertex;

/// A triangulated periodic surface with half-edge connectivity.
#[derive(Debug, Clone, PartialEq)]
pub struct MembraneMesh {
    pub(crate) pbc: PeriodicBox,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) links: Vec<Link>,
    pub(crate) inclusions: Vec<Inclusion>,
    pub(crate) exclusions: Vec<Exclusion>,
}

impl MembraneMesh {
    /// Create an empty mesh with pre-allocated arenas.
    pub(crate) fn with_capacity(pbc: PeriodicBox, num_vertices: usize, num_triangles: usize) -> Self {
        Self {
            pbc,
            vertices: Vec::with_capacity(num_vertices),
            triangles: Vec::with_capacity(num_triangles),
            links: Vec::with_capacity(num_triangles * 3),
            inclusions: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    // ==================== Accessors ====================

    /// The periodic box.
    #[inline]
    pub fn pbc(&self) -> &PeriodicBox {
        &self.pbc
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of links (half-edges).
    #[inline]
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// Number of unmirrored links.
    pub fn num_boundary_links(&self) -> usize {
        self.links.iter().filter(|l| l.kind == LinkKind::Boundary).count()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        let boundary = self.num_boundary_links();
        (self.links.len() - boundary) / 2 + boundary
    }

    /// Get a vertex by id.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get a triangle by id.
    #[inline]
    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id.index()]
    }

    /// Get a link by id.
    #[inline]
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.index()]
    }

    /// Get an inclusion by id.
    #[inline]
    pub fn inclusion(&self, id: InclusionId) -> &Inclusion {
        &self.inclusions[id.index()]
    }

    /// All inclusions, indexed by [`InclusionId`].
    #[inline]
    pub fn inclusions(&self) -> &[Inclusion] {
        &self.inclusions
    }

    /// All exclusions.
    #[inline]
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertices[v.index()].position
    }

    // ==================== Navigation ====================

    /// Next link in the same triangle.
    #[inline]
    pub fn next(&self, l: LinkId) -> LinkId {
        self.links[l.index()].neighbor1
    }

    /// Previous link in the same triangle.
    #[inline]
    pub fn prev(&self, l: LinkId) -> LinkId {
        self.links[l.index()].neighbor2
    }

    /// Mirror link, `None` on the boundary.
    #[inline]
    pub fn mirror(&self, l: LinkId) -> Option<LinkId> {
        self.links[l.index()].mirror
    }

    /// The link `from -> to`, if that directed edge exists.
    pub fn find_link(&self, from: VertexId, to: VertexId) -> Option<LinkId> {
        self.vertices[from.index()]
            .links
            .iter()
            .copied()
            .find(|&l| self.links[l.index()].v2 == to)
    }

    /// Minimum-image edge vector of a link, computed from current positions.
    pub fn edge_vector(&self, l: LinkId) -> Vector3<f64> {
        let link = &self.links[l.index()];
        self.pbc
            .displacement(self.position(link.v1), self.position(link.v2))
    }

    /// Corner positions of a triangle.
    pub fn triangle_positions(&self, t: TriangleId) -> [&Point3<f64>; 3] {
        let [a, b, c] = self.triangles[t.index()].vertices;
        [self.position(a), self.position(b), self.position(c)]
    }

    /// Whether a vertex touches a boundary link, incoming or outgoing.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.vertices[v.index()].links.iter().any(|&l| {
            self.links[l.index()].kind == LinkKind::Boundary
                || self.links[self.prev(l).index()].kind == LinkKind::Boundary
        })
    }

    /// Whether every edge has two triangles.
    pub fn is_closed(&self) -> bool {
        self.links.iter().all(|l| l.kind == LinkKind::Interior)
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex ids.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over vertices with their ids.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over all triangle ids.
    pub fn triangle_ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        (0..self.triangles.len()).map(TriangleId::new)
    }

    /// Iterate over triangles with their ids.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .map(|(i, t)| (TriangleId::new(i), t))
    }

    /// Iterate over all link ids.
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        (0..self.links.len()).map(LinkId::new)
    }

    /// Iterate over links with their ids.
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> + '_ {
        self.links
            .iter()
            .enumerate()
            .map(|(i, l)| (LinkId::new(i), l))
    }

    // ==================== Global quantities ====================

    /// `V - E + T`. Zero for a closed periodic sheet, two for a sphere.
    pub fn euler_characteristic(&self) -> i64 {
        self.num_vertices() as i64 - self.num_edges() as i64 + self.num_triangles() as i64
    }

    /// Sum of cached triangle areas.
    pub fn surface_area(&self) -> f64 {
        self.triangles.iter().map(|t| t.area).sum()
    }

    /// Smallest and largest cached principal curvature over all vertices.
    pub fn curvature_range(&self) -> Option<(f64, f64)> {
        self.vertices.iter().fold(None, |acc, v| {
            let (c1, c2) = v.curvature();
            Some(match acc {
                None => (c2, c1),
                Some((lo, hi)) => (f64::min(lo, c2), f64::max(hi, c1)),
            })
        })
    }

    /// Area-weighted sum of the cached Gaussian curvature, `Σ c1 c2 A`.
    pub fn total_gaussian_curvature(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.gaussian_curvature() * v.area())
            .sum()
    }

    // ==================== Validation ====================

    /// Check every connectivity invariant.
    ///
    /// Returns `false` on the first broken one; meant for tests and
    /// diagnostics.
    pub fn is_valid(&self) -> bool {
        let nv = self.vertices.len();
        let nt = self.triangles.len();
        let nl = self.links.len();

        for (lid, link) in self.links() {
            let ids_ok = link.v1.index() < nv
                && link.v2.index() < nv
                && link.v3.index() < nv
                && link.triangle.index() < nt
                && link.neighbor1.index() < nl
                && link.neighbor2.index() < nl;
            if !ids_ok {
                return false;
            }

            // The triangle cycle
            let n1 = self.link(link.neighbor1);
            let n2 = self.link(link.neighbor2);
            if self.next(link.neighbor1) != link.neighbor2 || self.next(link.neighbor2) != lid {
                return false;
            }
            if n1.v1 != link.v2 || n1.v2 != link.v3 || n2.v1 != link.v3 || n2.v2 != link.v1 {
                return false;
            }
            if n1.triangle != link.triangle || n2.triangle != link.triangle {
                return false;
            }
            if !self.triangle(link.triangle).contains(link.v1)
                || !self.triangle(link.triangle).contains(link.v2)
            {
                return false;
            }

            match (link.kind, link.mirror) {
                (LinkKind::Interior, Some(m)) => {
                    if m.index() >= nl {
                        return false;
                    }
                    let mirror = self.link(m);
                    if mirror.mirror != Some(lid) || mirror.v1 != link.v2 || mirror.v2 != link.v1 {
                        return false;
                    }
                }
                (LinkKind::Boundary, None) => {}
                _ => return false,
            }
        }

        for (vid, v) in self.vertices() {
            // One outgoing link per incident triangle corner
            if v.links.len() != v.triangles.len() {
                return false;
            }
            for &l in &v.links {
                if l.index() >= nl || self.link(l).v1 != vid {
                    return false;
                }
            }
            for &t in &v.triangles {
                if t.index() >= nt || !self.triangle(t).contains(vid) {
                    return false;
                }
            }
            for &n in &v.neighbors {
                if n.index() >= nv || !self.vertex(n).neighbors.contains(&vid) {
                    return false;
                }
                if self.find_link(vid, n).is_none() && self.find_link(n, vid).is_none() {
                    return false;
                }
            }
        }

        true
    }
}
