//! The geometry pass: normals, areas, shape operators and curvature.
//!
//! Runs in three sweeps, each reading only what the previous one wrote:
//!
//! 1. **Triangles**: unit normal and area from the minimum-image cross
//!    product of two edges.
//! 2. **Links**: edge vectors for every link; for each mirrored pair the edge
//!    normal, `Be` and `He` (see [`edge_shape`]), written to both halves.
//! 3. **Vertices**: barycentric area (a third of each incident triangle),
//!    area-weighted normal, and the principal curvatures and directions from
//!    the tangent projection of `Σ (n_v · n_e) He Be ⊗ Be`.
//!
//! Every vertex must belong to at least one triangle, otherwise its normal is
//! undefined and the pass fails with [`MeshError::ZeroVertexNormal`].

use log::debug;
use nalgebra::{Matrix3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{area_vector, edge_shape, LinkId, MembraneMesh, TriangleId, VertexId};

/// Eigenvector length below which the tangent block counts as isotropic.
const DIAGONAL_EPS: f64 = 1e-14;

/// Recompute every cached geometric quantity of the mesh.
///
/// # Errors
/// - [`MeshError::DegenerateTriangle`] for a zero-area triangle
/// - [`MeshError::ZeroLinkNormal`] when two adjacent triangles fold back onto
///   each other
/// - [`MeshError::DihedralOutOfRange`] when a dihedral cosine exceeds the
///   noise limit
/// - [`MeshError::ZeroVertexNormal`] when the normals around a vertex cancel
///
/// # Example
/// ```
/// use leaflet::algo::update_geometry;
/// use leaflet::mesh::{build_from_triangles, PeriodicBox, VertexId};
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
/// assert!((mesh.surface_area() - 0.5).abs() < 1e-12);
/// assert!((mesh.vertex(VertexId::new(0)).normal().z - 1.0).abs() < 1e-12);
/// ```
pub fn update_geometry(mesh: &mut MembraneMesh) -> Result<()> {
    for t in 0..mesh.num_triangles() {
        refresh_triangle(mesh, TriangleId::new(t))?;
    }
    update_links(mesh)?;
    update_vertices(mesh)?;

    debug!(
        "geometry updated: area {:.3}, {} vertices",
        mesh.surface_area(),
        mesh.num_vertices()
    );
    Ok(())
}

/// Recompute the normal and area of one triangle.
pub(crate) fn refresh_triangle(mesh: &mut MembraneMesh, t: TriangleId) -> Result<()> {
    let av = area_vector(mesh.pbc(), mesh.triangle_positions(t));
    let norm = av.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(MeshError::DegenerateTriangle { triangle: t.index() });
    }
    let tri = &mut mesh.triangles[t.index()];
    tri.normal = av / norm;
    tri.area = 0.5 * norm;
    Ok(())
}

/// Recompute the edge vector of a link and its mirror.
pub(crate) fn refresh_edge(mesh: &mut MembraneMesh, l: LinkId) {
    let edge = mesh.edge_vector(l);
    mesh.links[l.index()].set_edge(edge);
    if let Some(m) = mesh.mirror(l) {
        mesh.links[m.index()].set_edge(-edge);
    }
}

fn update_links(mesh: &mut MembraneMesh) -> Result<()> {
    for i in 0..mesh.num_links() {
        let l = LinkId::new(i);
        let mirror = match mesh.mirror(l) {
            Some(m) => m,
            None => {
                let edge = mesh.edge_vector(l);
                let link = &mut mesh.links[i];
                link.set_edge(edge);
                link.normal = Vector3::zeros();
                link.be = Vector3::zeros();
                link.he = 0.0;
                continue;
            }
        };
        // Each mirrored pair once, from its lower id
        if mirror < l {
            continue;
        }

        refresh_edge(mesh, l);
        let own = *mesh.triangle(mesh.link(l).triangle()).normal();
        let other = *mesh.triangle(mesh.link(mirror).triangle()).normal();
        let shape = edge_shape(l, mesh.link(l).edge_vector(), &own, &other)?;

        mesh.links[i].set_shape(&shape);
        mesh.links[mirror.index()].set_shape(&shape);
    }
    Ok(())
}

fn update_vertices(mesh: &mut MembraneMesh) -> Result<()> {
    for i in 0..mesh.num_vertices() {
        let v = VertexId::new(i);

        let mut area = 0.0;
        let mut weighted = Vector3::zeros();
        for &t in mesh.vertex(v).triangles() {
            let tri = mesh.triangle(t);
            area += tri.area() / 3.0;
            weighted += tri.normal() * tri.area();
        }
        let norm = weighted.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(MeshError::ZeroVertexNormal { vertex: i });
        }
        let normal = weighted / norm;

        let mut shape = Matrix3::zeros();
        for &l in mesh.vertex(v).links() {
            let link = mesh.link(l);
            if !link.is_interior() {
                continue;
            }
            let weight = normal.dot(link.normal()) * link.he();
            shape += link.be() * link.be().transpose() * weight;
        }

        let (curvature, frame) = principal_frame(&normal, &shape, area);

        let vertex = &mut mesh.vertices[i];
        vertex.area = area;
        vertex.normal = normal;
        vertex.curvature = curvature;
        vertex.set_frame(frame);
    }
    Ok(())
}

/// An orthonormal tangent basis `(t1, t2)` with `t1 × t2 = n`.
fn tangent_basis(n: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // Start from the axis least aligned with n
    let axis = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        Vector3::x()
    } else if n.y.abs() <= n.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let t1 = (axis - n * n.dot(&axis)).normalize();
    let t2 = n.cross(&t1);
    (t1, t2)
}

/// Diagonalize the tangent block of a vertex shape operator.
///
/// Returns `[c1, c2]` with `c1 >= c2` and the local-to-global frame whose
/// columns are the principal directions and the normal.
fn principal_frame(n: &Vector3<f64>, shape: &Matrix3<f64>, area: f64) -> ([f64; 2], Matrix3<f64>) {
    let projector = Matrix3::identity() - n * n.transpose();
    let s = projector * shape * projector;
    let (t1, t2) = tangent_basis(n);

    let a = t1.dot(&(s * t1));
    let b = t1.dot(&(s * t2));
    let d = t2.dot(&(s * t2));

    let half_trace = 0.5 * (a + d);
    let radius = (0.25 * (a - d) * (a - d) + b * b).sqrt();
    let l1 = half_trace + radius;
    let l2 = half_trace - radius;

    // Of the two eigenvector forms take the one away from cancellation
    let (x, y) = if a >= d { (l1 - d, b) } else { (b, l1 - a) };
    let len = (x * x + y * y).sqrt();
    let (p, q) = if len > DIAGONAL_EPS {
        (x / len, y / len)
    } else {
        (1.0, 0.0)
    };

    let p1 = t1 * p + t2 * q;
    let p2 = t2 * p - t1 * q;
    let frame = Matrix3::from_columns(&[p1, p2, *n]);

    ([l1 / area, l2 / area], frame)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, PeriodicBox};
    use nalgebra::Point3;
    use std::collections::HashMap;

    /// Periodic `n x n` sheet at height `z` with unit spacing.
    pub(crate) fn flat_sheet(n: usize, z: f64) -> MembraneMesh {
        let pbc = PeriodicBox::new(n as f64, n as f64, 20.0).unwrap();
        let mut positions = Vec::new();
        for j in 0..n {
            for i in 0..n {
                positions.push(Point3::new(i as f64, j as f64, z));
            }
        }
        let idx = |i: usize, j: usize| (j % n) * n + (i % n);
        let mut faces = Vec::new();
        for j in 0..n {
            for i in 0..n {
                faces.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
                faces.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
            }
        }
        build_from_triangles(pbc, &positions, &faces).unwrap()
    }

    /// Icosphere of the given radius centred in a 10^3 box.
    pub(crate) fn icosphere(subdivisions: usize, radius: f64) -> MembraneMesh {
        let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let mut unit: Vec<Vector3<f64>> = [
            (-1.0, phi, 0.0),
            (1.0, phi, 0.0),
            (-1.0, -phi, 0.0),
            (1.0, -phi, 0.0),
            (0.0, -1.0, phi),
            (0.0, 1.0, phi),
            (0.0, -1.0, -phi),
            (0.0, 1.0, -phi),
            (phi, 0.0, -1.0),
            (phi, 0.0, 1.0),
            (-phi, 0.0, -1.0),
            (-phi, 0.0, 1.0),
        ]
        .iter()
        .map(|&(x, y, z)| Vector3::new(x, y, z).normalize())
        .collect();

        let mut faces: Vec<[usize; 3]> = vec![
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];

        for _ in 0..subdivisions {
            let mut mids: HashMap<(usize, usize), usize> = HashMap::new();
            let mut next = Vec::with_capacity(faces.len() * 4);
            for face in &faces {
                let mut m = [0usize; 3];
                for k in 0..3 {
                    let (a, b) = (face[k], face[(k + 1) % 3]);
                    let key = (a.min(b), a.max(b));
                    m[k] = *mids.entry(key).or_insert_with(|| {
                        unit.push(((unit[a] + unit[b]) * 0.5).normalize());
                        unit.len() - 1
                    });
                }
                next.push([face[0], m[0], m[2]]);
                next.push([face[1], m[1], m[0]]);
                next.push([face[2], m[2], m[1]]);
                next.push([m[0], m[1], m[2]]);
            }
            faces = next;
        }

        let centre = Point3::new(5.0, 5.0, 5.0);
        let positions: Vec<Point3<f64>> = unit.iter().map(|u| centre + u * radius).collect();
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        build_from_triangles(pbc, &positions, &faces).unwrap()
    }

    /// Cylinder of radius `r` along x, periodic in x, centred in a
    /// `nx * dx` by 10 by 10 box. `outward` picks the normal orientation.
    fn periodic_cylinder(nx: usize, nt: usize, r: f64, dx: f64, outward: bool) -> MembraneMesh {
        let pbc = PeriodicBox::new(nx as f64 * dx, 10.0, 10.0).unwrap();
        let idx = |i: usize, j: usize| (j % nt) * nx + (i % nx);
        let mut positions = Vec::with_capacity(nx * nt);
        for j in 0..nt {
            let theta = 2.0 * std::f64::consts::PI * j as f64 / nt as f64;
            for i in 0..nx {
                positions.push(Point3::new(
                    i as f64 * dx,
                    5.0 + r * theta.cos(),
                    5.0 + r * theta.sin(),
                ));
            }
        }
        let mut faces = Vec::with_capacity(2 * nx * nt);
        for j in 0..nt {
            for i in 0..nx {
                if outward {
                    faces.push([idx(i, j), idx(i, j + 1), idx(i + 1, j + 1)]);
                    faces.push([idx(i, j), idx(i + 1, j + 1), idx(i + 1, j)]);
                } else {
                    faces.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
                    faces.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
                }
            }
        }
        build_from_triangles(pbc, &positions, &faces).unwrap()
    }

    #[test]
    fn test_flat_sheet() {
        let mut mesh = flat_sheet(4, 3.0);
        update_geometry(&mut mesh).unwrap();

        assert!((mesh.surface_area() - 16.0).abs() < 1e-9);
        for (_, v) in mesh.vertices() {
            assert!((v.normal() - Vector3::z()).norm() < 1e-12);
            assert!((v.area() - 1.0).abs() < 1e-12);
            let (c1, c2) = v.curvature();
            assert!(c1.abs() < 1e-12 && c2.abs() < 1e-12);

            let (p1, p2) = v.principal_directions();
            assert!(p1.dot(v.normal()).abs() < 1e-12);
            assert!(p2.dot(v.normal()).abs() < 1e-12);
            assert!((p1.cross(&p2) - v.normal()).norm() < 1e-12);
        }
        for (_, l) in mesh.links() {
            assert_eq!(l.he(), 0.0);
            assert!(l.edge_length() <= 2.0_f64.sqrt() + 1e-12);
        }
    }

    #[test]
    fn test_edges_across_the_box_use_minimum_image() {
        let mut mesh = flat_sheet(4, 3.0);
        update_geometry(&mut mesh).unwrap();
        let l = mesh.find_link(VertexId::new(3), VertexId::new(0)).unwrap();
        let e = mesh.link(l).edge_vector();
        assert!((e - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        let m = mesh.mirror(l).unwrap();
        assert!((mesh.link(m).edge_vector() + e).norm() < 1e-12);
    }

    #[test]
    fn test_sphere_curvature() {
        let radius = 2.0;
        let mut mesh = icosphere(3, radius);
        update_geometry(&mut mesh).unwrap();

        let mut mean_sum = 0.0;
        for (_, v) in mesh.vertices() {
            let (c1, c2) = v.curvature();
            assert!(c1 >= c2);
            assert!(c2 > 0.0, "sphere curvature should be positive, got {}", c2);
            mean_sum += v.mean_curvature();
        }
        assert!(mesh.total_gaussian_curvature() > 0.0);
        let mean = mean_sum / mesh.num_vertices() as f64;
        assert!(
            (mean * radius - 1.0).abs() < 0.1,
            "mean curvature should be ~1/R, got {}",
            mean
        );
    }

    #[test]
    fn test_sphere_normals_point_outward() {
        let mut mesh = icosphere(2, 1.0);
        update_geometry(&mut mesh).unwrap();
        let centre = Point3::new(5.0, 5.0, 5.0);
        for (_, v) in mesh.vertices() {
            let radial = (v.position() - centre).normalize();
            assert!(radial.dot(v.normal()) > 0.99);
        }
    }

    #[test]
    fn test_closed_surface_has_no_net_flux() {
        let mut mesh = icosphere(2, 1.0);
        update_geometry(&mut mesh).unwrap();

        let triangle_flux: Vector3<f64> = mesh
            .triangles()
            .map(|(_, t)| t.normal() * t.area())
            .sum();
        assert!(triangle_flux.norm() < 1e-9);

        let vertex_flux: Vector3<f64> = mesh.vertices().map(|(_, v)| v.normal() * v.area()).sum();
        let total: f64 = mesh.vertices().map(|(_, v)| v.area()).sum();
        assert!((total - mesh.surface_area()).abs() < 1e-9);
        assert!(vertex_flux.norm() < 1e-6 * total);
    }

    #[test]
    fn test_frames_are_rotations() {
        let mut mesh = icosphere(1, 1.0);
        update_geometry(&mut mesh).unwrap();
        for (_, v) in mesh.vertices() {
            let r = v.local_to_global();
            assert!((r.transpose() * r - Matrix3::identity()).norm() < 1e-9);
            assert!((r.determinant() - 1.0).abs() < 1e-9);
            assert!((r.column(2).into_owned() - v.normal()).norm() < 1e-12);
        }
    }

    #[test]
    fn test_principal_frame_picks_largest_first() {
        let n = Vector3::z();
        // Bending only along y
        let shape = Matrix3::new(0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0);
        let ([c1, c2], frame) = principal_frame(&n, &shape, 2.0);
        assert!((c1 - 1.0).abs() < 1e-12);
        assert!(c2.abs() < 1e-12);
        assert!(frame.column(0).dot(&Vector3::y()).abs() > 1.0 - 1e-12);
    }

    #[test]
    fn test_principal_frame_off_diagonal() {
        let n = Vector3::z();
        let b = Vector3::new(1.0, 1.0, 0.0).normalize();
        let shape = b * b.transpose() * 3.0;
        let ([c1, c2], frame) = principal_frame(&n, &shape, 1.0);
        assert!((c1 - 3.0).abs() < 1e-12);
        assert!(c2.abs() < 1e-12);
        assert!(frame.column(0).dot(&b).abs() > 1.0 - 1e-12);
    }

    #[test]
    fn test_cylinder_curvature_and_directions() {
        let radius = 2.0;
        let mut mesh = periodic_cylinder(4, 16, radius, 0.5, true);
        assert!(mesh.is_closed());
        update_geometry(&mut mesh).unwrap();

        for (_, v) in mesh.vertices() {
            let (c1, c2) = v.curvature();
            assert!((c1 - 1.0 / radius).abs() < 1e-6, "c1 = {}", c1);
            assert!(c2.abs() < 1e-6, "c2 = {}", c2);
            assert!(v.normal().x.abs() < 1e-9);

            // bent around the circumference, straight along the axis
            let (p1, p2) = v.principal_directions();
            assert!(p1.x.abs() < 1e-6);
            assert!(p2.x.abs() > 1.0 - 1e-6);
        }
        assert!(mesh.total_gaussian_curvature().abs() < 1e-9);
    }

    #[test]
    fn test_inward_cylinder_flips_curvature_sign() {
        let radius = 2.0;
        let mut mesh = periodic_cylinder(4, 16, radius, 0.5, false);
        update_geometry(&mut mesh).unwrap();

        for (_, v) in mesh.vertices() {
            let (c1, c2) = v.curvature();
            assert!(c1.abs() < 1e-6, "c1 = {}", c1);
            assert!((c2 + 1.0 / radius).abs() < 1e-6, "c2 = {}", c2);

            let (p1, _) = v.principal_directions();
            assert!(p1.x.abs() > 1.0 - 1e-6);
        }
    }

    #[test]
    fn test_principal_frame_near_diagonal_block() {
        let n = Vector3::z();
        // Concave along y with round-off coupling
        let shape = Matrix3::new(0.0, 1e-13, 0.0, 1e-13, -2.0, 0.0, 0.0, 0.0, 0.0);
        let ([c1, c2], frame) = principal_frame(&n, &shape, 1.0);
        assert!(c1.abs() < 1e-12);
        assert!((c2 + 2.0).abs() < 1e-12);
        assert!(frame.column(0).dot(&Vector3::x()).abs() > 1.0 - 1e-12);
    }

    #[test]
    fn test_degenerate_triangle_is_fatal() {
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        let positions = vec![
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 1.0, 1.0),
            Point3::new(3.0, 1.0, 1.0),
        ];
        let mut mesh = build_from_triangles(pbc, &positions, &[[0, 1, 2]]).unwrap();
        assert!(matches!(
            update_geometry(&mut mesh).unwrap_err(),
            MeshError::DegenerateTriangle { triangle: 0 }
        ));
    }

    #[test]
    fn test_isolated_vertex_is_fatal() {
        let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
        let positions = vec![
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 1.0, 1.0),
            Point3::new(1.0, 2.0, 1.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let mut mesh = build_from_triangles(pbc, &positions, &[[0, 1, 2]]).unwrap();
        assert!(matches!(
            update_geometry(&mut mesh).unwrap_err(),
            MeshError::ZeroVertexNormal { vertex: 3 }
        ));
    }
}
