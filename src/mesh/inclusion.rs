//! Inclusion and exclusion records attached to mesh vertices.
//!
//! The mesh never interprets these; it only keeps them bound to stable
//! vertex ids so the projector can re-key them by point id.

use nalgebra::Vector2;

use super::index::VertexId;

/// A protein-like entity sitting on one vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Inclusion {
    pub(crate) type_id: i32,
    pub(crate) vertex: VertexId,
    pub(crate) direction: Vector2<f64>,
}

impl Inclusion {
    /// Create an inclusion. `direction` must already be a unit vector in the
    /// vertex tangent frame.
    pub fn new(type_id: i32, vertex: VertexId, direction: Vector2<f64>) -> Self {
        Self {
            type_id,
            vertex,
            direction,
        }
    }

    /// Inclusion type id.
    #[inline]
    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    /// Host vertex.
    #[inline]
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Unit direction in the host vertex's tangent frame.
    #[inline]
    pub fn direction(&self) -> &Vector2<f64> {
        &self.direction
    }
}

/// A circular region around one vertex where no lipids are placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub(crate) vertex: VertexId,
    pub(crate) radius: f64,
}

impl Exclusion {
    /// Create an exclusion.
    pub fn new(vertex: VertexId, radius: f64) -> Self {
        Self { vertex, radius }
    }

    /// Centre vertex.
    #[inline]
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Exclusion radius.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

/// Normalize a tangent direction read from input.
///
/// Returns `None` for a zero (or non-finite) vector so the caller can decide
/// on a fallback.
pub(crate) fn unit_direction(x: f64, y: f64) -> Option<Vector2<f64>> {
    let v = Vector2::new(x, y);
    let n = v.norm();
    if n > 0.0 && n.is_finite() {
        Some(v / n)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_direction() {
        let d = unit_direction(3.0, 4.0).unwrap();
        assert!((d - Vector2::new(0.6, 0.8)).norm() < 1e-12);
        assert!(unit_direction(0.0, 0.0).is_none());
        assert!(unit_direction(f64::INFINITY, 0.0).is_none());
    }
}
