//! Surface-to-points projection.
//!
//! Every vertex of a finished mesh becomes one point per leaflet, offset by
//! half the bilayer thickness along the vertex normal. Points carry the
//! vertex's area, normal, principal directions, principal curvatures and
//! domain, and their id is the vertex id, so ids are dense, zero-based and
//! stable for a given input.

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{MembraneMesh, PeriodicBox, VertexId};

/// Which leaflets to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Upper and lower leaflet.
    #[default]
    Bilayer,
    /// A single leaflet on the normal side.
    MonolayerUpper,
    /// A single leaflet on the side opposite the normal, with flipped frame.
    MonolayerLower,
}

impl Layout {
    /// Map the `-monolayer` style flag: `0` bilayer, `1` upper, `-1` lower.
    pub fn from_flag(flag: i32) -> Result<Self> {
        match flag {
            0 => Ok(Layout::Bilayer),
            1 => Ok(Layout::MonolayerUpper),
            -1 => Ok(Layout::MonolayerLower),
            other => Err(MeshError::invalid_param(
                "monolayer",
                other,
                "must be -1, 0 or 1",
            )),
        }
    }

    /// Whether only one leaflet is produced.
    pub fn is_monolayer(self) -> bool {
        self != Layout::Bilayer
    }
}

/// Options for [`project`].
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    /// Distance between the two leaflets.
    pub thickness: f64,
    /// Leaflet layout.
    pub layout: Layout,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            thickness: 3.8,
            layout: Layout::Bilayer,
        }
    }
}

impl ProjectOptions {
    /// Create options for a bilayer of the given thickness.
    pub fn new(thickness: f64) -> Self {
        Self {
            thickness,
            ..Default::default()
        }
    }

    /// Set the leaflet layout.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the thickness.
    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.thickness.is_finite() && self.thickness > 0.0) {
            return Err(MeshError::invalid_param(
                "thickness",
                self.thickness,
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// One projected point.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafletPoint {
    /// Point id, equal to the source vertex id.
    pub id: usize,
    /// Domain id.
    pub domain: i32,
    /// Area represented by the point.
    pub area: f64,
    /// Position, wrapped into the box.
    pub position: Point3<f64>,
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// First principal direction.
    pub p1: Vector3<f64>,
    /// Second principal direction.
    pub p2: Vector3<f64>,
    /// Larger principal curvature.
    pub c1: f64,
    /// Smaller principal curvature.
    pub c2: f64,
    /// Whether the source vertex lies on an open boundary.
    pub on_boundary: bool,
}

/// An inclusion re-keyed by point id.
#[derive(Debug, Clone, PartialEq)]
pub struct PointInclusion {
    /// Inclusion id.
    pub id: usize,
    /// Inclusion type.
    pub type_id: i32,
    /// Host point id.
    pub point: usize,
    /// Unit direction in global coordinates.
    pub direction: Vector3<f64>,
}

/// An exclusion re-keyed by point id.
#[derive(Debug, Clone, PartialEq)]
pub struct PointExclusion {
    /// Exclusion id.
    pub id: usize,
    /// Centre point id.
    pub point: usize,
    /// Radius.
    pub radius: f64,
}

/// The projected point sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Bilayer {
    /// Periodic box of the source mesh.
    pub pbc: PeriodicBox,
    /// Upper leaflet, or the single leaflet of a monolayer.
    pub outer: Vec<LeafletPoint>,
    /// Lower leaflet; empty for a monolayer.
    pub inner: Vec<LeafletPoint>,
    /// Inclusions.
    pub inclusions: Vec<PointInclusion>,
    /// Exclusions.
    pub exclusions: Vec<PointExclusion>,
    /// Whether only one leaflet was produced.
    pub monolayer: bool,
}

/// Project a mesh with up-to-date geometry onto leaflet point sets.
///
/// # Example
/// ```
/// use leaflet::algo::{project, update_geometry, ProjectOptions};
/// use leaflet::mesh::{build_from_triangles, PeriodicBox};
/// use nalgebra::Point3;
///
/// let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
/// let positions = vec![
///     Point3::new(1.0, 1.0, 5.0),
///     Point3::new(2.0, 1.0, 5.0),
///     Point3::new(1.0, 2.0, 5.0),
/// ];
/// let mut mesh = build_from_triangles(pbc, &positions, &[[0, 1, 2]]).unwrap();
/// update_geometry(&mut mesh).unwrap();
///
/// let bilayer = project(&mesh, &ProjectOptions::new(2.0)).unwrap();
/// assert!((bilayer.outer[0].position.z - 6.0).abs() < 1e-12);
/// assert!((bilayer.inner[0].position.z - 4.0).abs() < 1e-12);
/// ```
pub fn project(mesh: &MembraneMesh, options: &ProjectOptions) -> Result<Bilayer> {
    options.validate()?;
    let half = 0.5 * options.thickness;

    let (outer, inner) = match options.layout {
        Layout::Bilayer => (leaflet(mesh, half, 1.0), leaflet(mesh, -half, 1.0)),
        Layout::MonolayerUpper => (leaflet(mesh, half, 1.0), Vec::new()),
        Layout::MonolayerLower => (leaflet(mesh, -half, -1.0), Vec::new()),
    };

    let inclusions = mesh
        .inclusions()
        .iter()
        .enumerate()
        .map(|(id, inc)| {
            let v = mesh.vertex(inc.vertex());
            let d = inc.direction();
            let global = v.tangent_to_global(d.x, d.y);
            PointInclusion {
                id,
                type_id: inc.type_id(),
                point: inc.vertex().index(),
                direction: global.try_normalize(0.0).unwrap_or(global),
            }
        })
        .collect();

    let exclusions = mesh
        .exclusions()
        .iter()
        .enumerate()
        .map(|(id, exc)| PointExclusion {
            id,
            point: exc.vertex().index(),
            radius: exc.radius(),
        })
        .collect();

    debug!(
        "projected {} outer and {} inner points",
        outer.len(),
        inner.len()
    );

    Ok(Bilayer {
        pbc: *mesh.pbc(),
        outer,
        inner,
        inclusions,
        exclusions,
        monolayer: options.layout.is_monolayer(),
    })
}

/// Offset every vertex by `offset` along its normal; `frame_sign` flips the
/// normal and principal directions.
fn leaflet(mesh: &MembraneMesh, offset: f64, frame_sign: f64) -> Vec<LeafletPoint> {
    mesh.vertices()
        .map(|(id, v)| {
            let (p1, p2) = v.principal_directions();
            let (c1, c2) = v.curvature();
            LeafletPoint {
                id: id.index(),
                domain: v.domain(),
                area: v.area(),
                position: mesh.pbc().wrap(&(v.position() + v.normal() * offset)),
                normal: v.normal() * frame_sign,
                p1: p1 * frame_sign,
                p2: p2 * frame_sign,
                c1,
                c2,
                on_boundary: mesh.is_boundary_vertex(id),
            }
        })
        .collect()
}

impl Bilayer {
    /// The point of the outer leaflet generated from vertex `v`.
    pub fn outer_point(&self, v: VertexId) -> Option<&LeafletPoint> {
        self.outer.get(v.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::geometry::tests::{flat_sheet, icosphere};
    use crate::algo::update_geometry;
    use crate::mesh::{
        build_mesh, ExclusionRecord, InclusionRecord, SurfaceDescription, TriangleRecord,
        VertexRecord,
    };
    use nalgebra::Vector2;

    #[test]
    fn test_flat_sheet_round_trip() {
        let z = 7.0;
        let t = 3.8;
        let mut mesh = flat_sheet(4, z);
        update_geometry(&mut mesh).unwrap();

        let bilayer = project(&mesh, &ProjectOptions::new(t)).unwrap();
        assert!(!bilayer.monolayer);
        assert_eq!(bilayer.outer.len(), mesh.num_vertices());
        assert_eq!(bilayer.inner.len(), mesh.num_vertices());

        for (i, (up, low)) in bilayer.outer.iter().zip(&bilayer.inner).enumerate() {
            assert_eq!(up.id, i);
            assert_eq!(low.id, i);
            assert!((up.position.z - (z + t / 2.0)).abs() < 1e-12);
            assert!((low.position.z - (z - t / 2.0)).abs() < 1e-12);
            assert!((up.position.x - low.position.x).abs() < 1e-12);
            for p in [up, low] {
                assert!(p.c1.abs() < 1e-12 && p.c2.abs() < 1e-12);
                assert!((p.normal - Vector3::z()).norm() < 1e-12);
                assert!((p.area - 1.0).abs() < 1e-12);
                assert!(!p.on_boundary);
            }
        }
    }

    #[test]
    fn test_sphere_leaflets_straddle_surface() {
        let mut mesh = icosphere(2, 3.0);
        update_geometry(&mut mesh).unwrap();
        let bilayer = project(&mesh, &ProjectOptions::new(1.0)).unwrap();
        let centre = Point3::new(5.0, 5.0, 5.0);
        for (up, low) in bilayer.outer.iter().zip(&bilayer.inner) {
            let r_up = (up.position - centre).norm();
            let r_low = (low.position - centre).norm();
            assert!(r_up > 3.4 && r_up < 3.5 + 1e-9);
            assert!(r_low > 2.5 - 1e-9 && r_low < 2.6);
            assert!(up.c2 > 0.0);
        }
    }

    #[test]
    fn test_positions_wrap_into_box() {
        let mut mesh = flat_sheet(4, 0.5);
        update_geometry(&mut mesh).unwrap();
        let bilayer = project(&mesh, &ProjectOptions::new(2.0)).unwrap();
        let lz = mesh.pbc().lengths().z;
        for p in &bilayer.inner {
            assert!((p.position.z - (lz - 0.5)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_monolayer_lower_flips_frame() {
        let mut mesh = flat_sheet(4, 7.0);
        update_geometry(&mut mesh).unwrap();
        let options = ProjectOptions::new(2.0).with_layout(Layout::MonolayerLower);
        let bilayer = project(&mesh, &options).unwrap();

        assert!(bilayer.monolayer);
        assert!(bilayer.inner.is_empty());
        let (p1, _) = mesh.vertex(VertexId::new(0)).principal_directions();
        let p = &bilayer.outer[0];
        assert!((p.position.z - 6.0).abs() < 1e-12);
        assert!((p.normal + Vector3::z()).norm() < 1e-12);
        assert!((p.p1 + p1).norm() < 1e-12);
    }

    #[test]
    fn test_monolayer_upper() {
        let mut mesh = flat_sheet(3, 7.0);
        update_geometry(&mut mesh).unwrap();
        let options = ProjectOptions::new(2.0).with_layout(Layout::from_flag(1).unwrap());
        let bilayer = project(&mesh, &options).unwrap();
        assert!(bilayer.monolayer);
        assert!((bilayer.outer[4].position.z - 8.0).abs() < 1e-12);
        assert!(Layout::from_flag(2).is_err());
    }

    #[test]
    fn test_rejects_bad_thickness() {
        let mut mesh = flat_sheet(3, 7.0);
        update_geometry(&mut mesh).unwrap();
        assert!(project(&mesh, &ProjectOptions::new(0.0)).is_err());
        assert!(project(&mesh, &ProjectOptions::new(f64::NAN)).is_err());
    }

    #[test]
    fn test_inclusion_direction_in_global_frame() {
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        let mut desc = SurfaceDescription::new(
            pbc,
            vec![
                VertexRecord { id: 1, position: Point3::new(1.0, 1.0, 5.0), domain: 0 },
                VertexRecord { id: 2, position: Point3::new(2.0, 1.0, 5.0), domain: 0 },
                VertexRecord { id: 3, position: Point3::new(1.0, 2.0, 5.0), domain: 0 },
            ],
            vec![TriangleRecord { id: 0, vertices: [1, 2, 3] }],
        );
        desc.inclusions.push(InclusionRecord {
            id: 0,
            type_id: 9,
            vertex: 3,
            direction: Vector2::new(0.0, 1.0),
        });
        desc.exclusions.push(ExclusionRecord { id: 0, vertex: 2, radius: 0.7 });
        let mut mesh = build_mesh(&desc).unwrap();
        update_geometry(&mut mesh).unwrap();

        let bilayer = project(&mesh, &ProjectOptions::default()).unwrap();
        let inc = &bilayer.inclusions[0];
        assert_eq!(inc.point, 2);
        assert_eq!(inc.type_id, 9);
        let (_, p2) = mesh.vertex(VertexId::new(2)).principal_directions();
        assert!((inc.direction - p2).norm() < 1e-12);
        assert!(inc.direction.dot(&Vector3::z()).abs() < 1e-12);

        assert_eq!(bilayer.exclusions[0].point, 1);
        assert!(bilayer.outer.iter().all(|p| p.on_boundary));
    }
}
