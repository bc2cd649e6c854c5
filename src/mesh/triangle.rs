//! Mesh triangles.

use nalgebra::{Point3, Vector3};

use super::index::VertexId;
use super::pbc::PeriodicBox;

/// An oriented triangle.
///
/// The vertex order defines the orientation: the cached normal points along
/// `(p1 - p0) × (p2 - p0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub(crate) vertices: [VertexId; 3],
    pub(crate) normal: Vector3<f64>,
    pub(crate) area: f64,
}

impl Triangle {
    /// Create a triangle with empty geometry caches.
    pub fn new(vertices: [VertexId; 3]) -> Self {
        Self {
            vertices,
            normal: Vector3::zeros(),
            area: 0.0,
        }
    }

    /// The ordered vertex triple.
    #[inline]
    pub fn vertices(&self) -> [VertexId; 3] {
        self.vertices
    }

    /// Cached unit normal.
    #[inline]
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// Cached area.
    #[inline]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Whether `v` is one of the corners.
    pub fn contains(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }
}

/// Unnormalized area vector of a periodic triangle: `(p1 - p0) × (p2 - p0)`
/// with minimum-image edges. Its norm is twice the area.
pub(crate) fn area_vector(pbc: &PeriodicBox, p: [&Point3<f64>; 3]) -> Vector3<f64> {
    let e1 = pbc.displacement(p[0], p[1]);
    let e2 = pbc.displacement(p[0], p[2]);
    e1.cross(&e2)
}

/// Interior angle at `a` of the triangle `(a, b, c)`, periodic-aware.
pub(crate) fn corner_angle(
    pbc: &PeriodicBox,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> f64 {
    let ab = pbc.displacement(a, b);
    let ac = pbc.displacement(a, c);
    let denom = ab.norm() * ac.norm();
    if denom < 1e-300 {
        return 0.0;
    }
    (ab.dot(&ac) / denom).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_vector_right_triangle() {
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        let p0 = Point3::new(1.0, 1.0, 1.0);
        let p1 = Point3::new(2.0, 1.0, 1.0);
        let p2 = Point3::new(1.0, 2.0, 1.0);
        let a = area_vector(&pbc, [&p0, &p1, &p2]);
        assert!((a - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_area_vector_across_boundary() {
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        // Same right triangle, but its first corner sits on the other side of x = 0
        let p0 = Point3::new(9.5, 1.0, 1.0);
        let p1 = Point3::new(0.5, 1.0, 1.0);
        let p2 = Point3::new(9.5, 2.0, 1.0);
        let a = area_vector(&pbc, [&p0, &p1, &p2]);
        assert!((a.norm() - 1.0).abs() < 1e-12);
        assert!(a.z > 0.0);
    }

    #[test]
    fn test_corner_angle() {
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        let a = Point3::new(1.0, 1.0, 1.0);
        let b = Point3::new(2.0, 1.0, 1.0);
        let c = Point3::new(1.0, 2.0, 1.0);
        let angle = corner_angle(&pbc, &a, &b, &c);
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_contains() {
        let t = Triangle::new([VertexId::new(0), VertexId::new(4), VertexId::new(2)]);
        assert!(t.contains(VertexId::new(4)));
        assert!(!t.contains(VertexId::new(1)));
    }
}
