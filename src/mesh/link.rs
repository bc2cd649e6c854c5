//! Links: the half-edges of the membrane mesh.
//!
//! A link runs from `v1` to `v2` inside its owning triangle `(v1, v2, v3)`,
//! so `v3` is the vertex opposite the edge. Inside a triangle the three links
//! form a cycle: `neighbor1` continues `v2 -> v3` and `neighbor2` closes
//! `v3 -> v1`. Interior edges are covered by two links in opposite directions
//! that point at each other through `mirror`; boundary edges have a single,
//! unmirrored link.
//!
//! Interior links also carry the discrete shape operator of their edge: a unit
//! tangent vector `Be` perpendicular to the edge and a signed bending scalar
//! `He` derived from the dihedral angle between the two adjacent triangles.

use nalgebra::Vector3;

use super::index::{LinkId, TriangleId, VertexId};
use crate::error::{MeshError, Result};

/// Cosines in `[1, DIHEDRAL_NOISE_LIMIT)` are treated as flat edges; anything
/// larger means the triangle normals are not unit vectors.
pub const DIHEDRAL_NOISE_LIMIT: f64 = 1.01;

/// Whether a link covers an interior or a boundary edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Mirrored edge shared by two triangles.
    Interior,
    /// Unmirrored edge on an open boundary. Never flipped.
    Boundary,
}

/// A directed half-edge owned by one triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub(crate) v1: VertexId,
    pub(crate) v2: VertexId,
    pub(crate) v3: VertexId,
    pub(crate) triangle: TriangleId,
    pub(crate) mirror: Option<LinkId>,
    pub(crate) neighbor1: LinkId,
    pub(crate) neighbor2: LinkId,
    pub(crate) kind: LinkKind,

    pub(crate) edge_vector: Vector3<f64>,
    pub(crate) edge_length: f64,
    pub(crate) normal: Vector3<f64>,
    pub(crate) be: Vector3<f64>,
    pub(crate) he: f64,
}

impl Link {
    /// Create an unmirrored link `v1 -> v2` opposite `v3` in `triangle`.
    pub fn new(v1: VertexId, v2: VertexId, v3: VertexId, triangle: TriangleId) -> Self {
        Self {
            v1,
            v2,
            v3,
            triangle,
            mirror: None,
            neighbor1: LinkId::invalid(),
            neighbor2: LinkId::invalid(),
            kind: LinkKind::Boundary,
            edge_vector: Vector3::zeros(),
            edge_length: 0.0,
            normal: Vector3::zeros(),
            be: Vector3::zeros(),
            he: 0.0,
        }
    }

    /// Start vertex.
    #[inline]
    pub fn v1(&self) -> VertexId {
        self.v1
    }

    /// End vertex.
    #[inline]
    pub fn v2(&self) -> VertexId {
        self.v2
    }

    /// Vertex of the owning triangle opposite this edge.
    #[inline]
    pub fn v3(&self) -> VertexId {
        self.v3
    }

    /// Owning triangle.
    #[inline]
    pub fn triangle(&self) -> TriangleId {
        self.triangle
    }

    /// The opposite half-edge, `None` for boundary links.
    #[inline]
    pub fn mirror(&self) -> Option<LinkId> {
        self.mirror
    }

    /// Next link in the triangle (`v2 -> v3`).
    #[inline]
    pub fn neighbor1(&self) -> LinkId {
        self.neighbor1
    }

    /// Previous link in the triangle (`v3 -> v1`).
    #[inline]
    pub fn neighbor2(&self) -> LinkId {
        self.neighbor2
    }

    /// Interior or boundary.
    #[inline]
    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// Shorthand for `kind() == LinkKind::Interior`.
    #[inline]
    pub fn is_interior(&self) -> bool {
        self.kind == LinkKind::Interior
    }

    /// Minimum-image vector from `v1` to `v2`, as of the last geometry update.
    #[inline]
    pub fn edge_vector(&self) -> &Vector3<f64> {
        &self.edge_vector
    }

    /// Length of [`Link::edge_vector`].
    #[inline]
    pub fn edge_length(&self) -> f64 {
        self.edge_length
    }

    /// Unit edge normal (average of the two triangle normals). Zero on boundary links.
    #[inline]
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// Shape-operator direction `Be`.
    #[inline]
    pub fn be(&self) -> &Vector3<f64> {
        &self.be
    }

    /// Shape-operator magnitude `He`.
    #[inline]
    pub fn he(&self) -> f64 {
        self.he
    }

    pub(crate) fn set_edge(&mut self, vector: Vector3<f64>) {
        self.edge_length = vector.norm();
        self.edge_vector = vector;
    }

    pub(crate) fn set_shape(&mut self, shape: &EdgeShape) {
        self.normal = shape.normal;
        self.be = shape.be;
        self.he = shape.he;
    }
}

/// Bending data of one interior edge, shared by both of its links.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeShape {
    /// Unit edge normal.
    pub normal: Vector3<f64>,
    /// Unit tangent vector perpendicular to the edge.
    pub be: Vector3<f64>,
    /// Signed bending magnitude; positive on convex edges.
    pub he: f64,
}

/// Compute the shape operator of an interior edge.
///
/// `edge` is the minimum-image vector of the link, `own_normal` the normal of
/// its triangle and `mirror_normal` the normal of the mirror's triangle. With
/// `cos θ = mirror_normal · own_normal` the magnitude is
/// `|e| * sqrt((1 - cos θ) / 2)`, negative when
/// `ê · (mirror_normal × own_normal) > 0` (a concave fold).
pub fn edge_shape(
    link: LinkId,
    edge: &Vector3<f64>,
    own_normal: &Vector3<f64>,
    mirror_normal: &Vector3<f64>,
) -> Result<EdgeShape> {
    let sum = own_normal + mirror_normal;
    let norm = sum.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(MeshError::ZeroLinkNormal { link: link.index() });
    }
    let normal = sum / norm;

    let length = edge.norm();
    if length == 0.0 {
        return Err(MeshError::ZeroLinkNormal { link: link.index() });
    }
    let direction = edge / length;

    let be = normal.cross(&direction);
    let be_norm = be.norm();
    if be_norm == 0.0 {
        return Err(MeshError::ZeroLinkNormal { link: link.index() });
    }
    let be = be / be_norm;

    let sign = direction.dot(&mirror_normal.cross(own_normal));
    let cosine = mirror_normal.dot(own_normal);

    let he = if cosine < 1.0 {
        let magnitude = length * (0.5 * (1.0 - cosine)).sqrt();
        if sign > 0.0 {
            -magnitude
        } else if sign < 0.0 {
            magnitude
        } else {
            0.0
        }
    } else if cosine < DIHEDRAL_NOISE_LIMIT {
        0.0
    } else {
        return Err(MeshError::DihedralOutOfRange {
            link: link.index(),
            cosine,
        });
    };

    Ok(EdgeShape { normal, be, he })
}
