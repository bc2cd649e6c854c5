//! Mesh vertices.

use nalgebra::{Matrix3, Point3, Vector3};

use super::index::{InclusionId, LinkId, TriangleId, VertexId};

/// A vertex of the membrane surface.
///
/// Besides its position the vertex carries the aggregated differential
/// geometry written by the geometry pass: normal, area share, the two
/// principal curvatures and the tangent frame. Its adjacency lists are
/// back-references into the arenas of the owning mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub(crate) position: Point3<f64>,
    pub(crate) normal: Vector3<f64>,
    pub(crate) area: f64,
    pub(crate) curvature: [f64; 2],
    pub(crate) local_to_global: Matrix3<f64>,
    pub(crate) global_to_local: Matrix3<f64>,
    pub(crate) domain: i32,
    pub(crate) inclusion: Option<InclusionId>,

    /// Outgoing links (links whose first vertex is this one).
    pub(crate) links: Vec<LinkId>,
    pub(crate) triangles: Vec<TriangleId>,
    pub(crate) neighbors: Vec<VertexId>,
}

impl Vertex {
    /// Create a vertex at an already wrapped position.
    pub fn new(position: Point3<f64>, domain: i32) -> Self {
        Self {
            position,
            normal: Vector3::zeros(),
            area: 0.0,
            curvature: [0.0; 2],
            local_to_global: Matrix3::identity(),
            global_to_local: Matrix3::identity(),
            domain,
            inclusion: None,
            links: Vec::new(),
            triangles: Vec::new(),
            neighbors: Vec::new(),
        }
    }

    /// Position inside the periodic box.
    #[inline]
    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    /// Unit outward normal.
    #[inline]
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// Area represented by this vertex.
    #[inline]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Principal curvatures `(c1, c2)` with `c1 >= c2`.
    #[inline]
    pub fn curvature(&self) -> (f64, f64) {
        (self.curvature[0], self.curvature[1])
    }

    /// Mean curvature `(c1 + c2) / 2`.
    pub fn mean_curvature(&self) -> f64 {
        0.5 * (self.curvature[0] + self.curvature[1])
    }

    /// Gaussian curvature `c1 * c2`.
    pub fn gaussian_curvature(&self) -> f64 {
        self.curvature[0] * self.curvature[1]
    }

    /// Local-to-global frame: columns are `p1`, `p2` and the normal.
    #[inline]
    pub fn local_to_global(&self) -> &Matrix3<f64> {
        &self.local_to_global
    }

    /// Global-to-local frame, the transpose of [`Vertex::local_to_global`].
    #[inline]
    pub fn global_to_local(&self) -> &Matrix3<f64> {
        &self.global_to_local
    }

    /// Principal directions `(p1, p2)` spanning the tangent plane.
    pub fn principal_directions(&self) -> (Vector3<f64>, Vector3<f64>) {
        (
            self.local_to_global.column(0).into_owned(),
            self.local_to_global.column(1).into_owned(),
        )
    }

    /// Map a direction from the tangent frame `(x, y)` to global coordinates.
    pub fn tangent_to_global(&self, x: f64, y: f64) -> Vector3<f64> {
        self.local_to_global * Vector3::new(x, y, 0.0)
    }

    /// Domain id.
    #[inline]
    pub fn domain(&self) -> i32 {
        self.domain
    }

    /// The inclusion held by this vertex, if any.
    #[inline]
    pub fn inclusion(&self) -> Option<InclusionId> {
        self.inclusion
    }

    /// Outgoing links.
    #[inline]
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// Incident triangles.
    #[inline]
    pub fn triangles(&self) -> &[TriangleId] {
        &self.triangles
    }

    /// Neighbouring vertices.
    #[inline]
    pub fn neighbors(&self) -> &[VertexId] {
        &self.neighbors
    }

    /// Number of neighbouring vertices.
    #[inline]
    pub fn valence(&self) -> usize {
        self.neighbors.len()
    }

    pub(crate) fn add_link(&mut self, l: LinkId) {
        self.links.push(l);
    }

    pub(crate) fn remove_link(&mut self, l: LinkId) {
        self.links.retain(|&x| x != l);
    }

    pub(crate) fn add_triangle(&mut self, t: TriangleId) {
        self.triangles.push(t);
    }

    pub(crate) fn remove_triangle(&mut self, t: TriangleId) {
        self.triangles.retain(|&x| x != t);
    }

    pub(crate) fn add_neighbor(&mut self, v: VertexId) {
        if !self.neighbors.contains(&v) {
            self.neighbors.push(v);
        }
    }

    pub(crate) fn remove_neighbor(&mut self, v: VertexId) {
        self.neighbors.retain(|&x| x != v);
    }

    pub(crate) fn set_frame(&mut self, local_to_global: Matrix3<f64>) {
        self.local_to_global = local_to_global;
        self.global_to_local = local_to_global.transpose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_creation() {
        let v = Vertex::new(Point3::new(1.0, 2.0, 3.0), 2);
        assert_eq!(*v.position(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(v.domain(), 2);
        assert!(v.inclusion().is_none());
        assert_eq!(v.valence(), 0);
    }

    #[test]
    fn test_adjacency_edits() {
        let mut v = Vertex::new(Point3::origin(), 0);
        v.add_neighbor(VertexId::new(1));
        v.add_neighbor(VertexId::new(1));
        v.add_neighbor(VertexId::new(2));
        assert_eq!(v.neighbors(), &[VertexId::new(1), VertexId::new(2)]);

        v.remove_neighbor(VertexId::new(1));
        assert_eq!(v.neighbors(), &[VertexId::new(2)]);

        v.add_link(LinkId::new(4));
        v.add_triangle(TriangleId::new(9));
        v.remove_link(LinkId::new(4));
        v.remove_triangle(TriangleId::new(9));
        assert!(v.links().is_empty());
        assert!(v.triangles().is_empty());
    }

    #[test]
    fn test_frame_and_curvature_accessors() {
        let mut v = Vertex::new(Point3::origin(), 0);
        v.curvature = [0.5, -0.25];
        assert!((v.mean_curvature() - 0.125).abs() < 1e-12);
        assert!((v.gaussian_curvature() + 0.125).abs() < 1e-12);

        // Frame rotated 90 degrees about z
        let r = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        v.set_frame(r);
        let (p1, p2) = v.principal_directions();
        assert!((p1 - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
        assert!((p2 - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((v.global_to_local() * v.local_to_global() - Matrix3::identity()).norm() < 1e-12);
        assert!((v.tangent_to_global(1.0, 0.0) - p1).norm() < 1e-12);
    }
}
