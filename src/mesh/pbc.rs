//! Periodic simulation box.
//!
//! Membrane meshes coming out of simulations live in an orthorhombic box with
//! periodic boundary conditions: a triangle may straddle the box face, so its
//! raw coordinate differences can be almost a full box length. Every edge
//! vector in this crate goes through [`PeriodicBox::displacement`], which
//! applies the minimum-image convention.

use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};

/// An orthorhombic periodic box with its origin at `(0, 0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    lengths: Vector3<f64>,
}

impl PeriodicBox {
    /// Create a box from its three edge lengths.
    ///
    /// Every length must be positive and finite.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self> {
        let valid = |l: f64| l.is_finite() && l > 0.0;
        if !(valid(x) && valid(y) && valid(z)) {
            return Err(MeshError::InvalidBox { x, y, z });
        }
        Ok(Self {
            lengths: Vector3::new(x, y, z),
        })
    }

    /// Create a box from a vector of edge lengths.
    pub fn from_lengths(lengths: Vector3<f64>) -> Result<Self> {
        Self::new(lengths.x, lengths.y, lengths.z)
    }

    /// The three edge lengths.
    #[inline]
    pub fn lengths(&self) -> &Vector3<f64> {
        &self.lengths
    }

    /// Wrap a position into `[0, L)` along every axis.
    pub fn wrap(&self, p: &Point3<f64>) -> Point3<f64> {
        let mut out = *p;
        for i in 0..3 {
            let l = self.lengths[i];
            let mut c = p[i].rem_euclid(l);
            // rem_euclid of a tiny negative number rounds up to exactly l
            if c >= l {
                c -= l;
            }
            out[i] = c;
        }
        out
    }

    /// Apply the minimum-image convention to a displacement.
    ///
    /// Each component is shifted by whole box lengths until it is no longer
    /// than half the box on that axis.
    pub fn minimum_image(&self, d: &Vector3<f64>) -> Vector3<f64> {
        let mut out = *d;
        for i in 0..3 {
            let l = self.lengths[i];
            if out[i].abs() > 0.5 * l {
                out[i] -= l * (out[i] / l).round();
            }
        }
        out
    }

    /// Minimum-image displacement from `from` to `to`.
    #[inline]
    pub fn displacement(&self, from: &Point3<f64>, to: &Point3<f64>) -> Vector3<f64> {
        self.minimum_image(&(to - from))
    }

    /// Minimum-image distance between two points.
    #[inline]
    pub fn distance(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        self.displacement(a, b).norm()
    }

    /// Midpoint of the shortest periodic segment between two points, wrapped.
    pub fn midpoint(&self, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
        self.wrap(&(a + self.displacement(a, b) * 0.5))
    }

    /// Return a copy of this box scaled per axis.
    pub fn scaled(&self, factors: &Vector3<f64>) -> Result<Self> {
        Self::from_lengths(self.lengths.component_mul(factors))
    }
}
