//! Mesh construction.
//!
//! Readers produce a [`SurfaceDescription`]: the box plus vertex, triangle,
//! inclusion and exclusion records keyed by the ids found in the file.
//! [`build_mesh`] maps those ids to dense indices and assembles the half-edge
//! connectivity.

use std::collections::HashMap;

use log::{debug, warn};
use nalgebra::{Point3, Vector2, Vector3};

use super::inclusion::{unit_direction, Exclusion, Inclusion};
use super::index::{InclusionId, LinkId, TriangleId, VertexId};
use super::link::{Link, LinkKind};
use super::pbc::PeriodicBox;
use super::surface::MembraneMesh;
use super::triangle::Triangle;
use super::vertex::Vertex;
use crate::error::{MeshError, Result};

/// A vertex record as read from input.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRecord {
    /// Id used by triangle and inclusion records.
    pub id: i64,
    /// Position, not necessarily wrapped.
    pub position: Point3<f64>,
    /// Domain id.
    pub domain: i32,
}

/// A triangle record as read from input.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleRecord {
    /// Triangle id, only used in error messages.
    pub id: i64,
    /// Vertex ids in orientation order.
    pub vertices: [i64; 3],
}

/// An inclusion record as read from input.
#[derive(Debug, Clone, PartialEq)]
pub struct InclusionRecord {
    /// Inclusion id, only used in error messages.
    pub id: i64,
    /// Inclusion type.
    pub type_id: i32,
    /// Host vertex id.
    pub vertex: i64,
    /// Direction in the tangent frame of the host vertex; normalized on build.
    pub direction: Vector2<f64>,
}

/// An exclusion record as read from input.
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionRecord {
    /// Exclusion id, only used in error messages.
    pub id: i64,
    /// Centre vertex id.
    pub vertex: i64,
    /// Radius.
    pub radius: f64,
}

/// Everything needed to assemble one mesh generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDescription {
    /// The periodic box.
    pub pbc: PeriodicBox,
    /// Vertices in input order.
    pub vertices: Vec<VertexRecord>,
    /// Triangles in input order.
    pub triangles: Vec<TriangleRecord>,
    /// Inclusions.
    pub inclusions: Vec<InclusionRecord>,
    /// Exclusions.
    pub exclusions: Vec<ExclusionRecord>,
}

impl SurfaceDescription {
    /// Create a description with no inclusions or exclusions.
    pub fn new(pbc: PeriodicBox, vertices: Vec<VertexRecord>, triangles: Vec<TriangleRecord>) -> Self {
        Self {
            pbc,
            vertices,
            triangles,
            inclusions: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    /// Scale the box and every vertex position per axis.
    pub fn rescale(&mut self, factors: &Vector3<f64>) -> Result<()> {
        self.pbc = self.pbc.scaled(factors)?;
        for v in &mut self.vertices {
            v.position = Point3::from(v.position.coords.component_mul(factors));
        }
        Ok(())
    }
}

/// Assemble a mesh from a description.
///
/// Vertex ids are mapped to dense indices in input order, so vertex `i` of
/// the result is the `i`-th vertex record. Positions are wrapped into the box.
///
/// # Errors
/// - [`MeshError::EmptyMesh`] if there are no triangles
/// - [`MeshError::DuplicateVertexId`] if a vertex id repeats
/// - [`MeshError::InvalidVertexIndex`] if a triangle names an unknown vertex
/// - [`MeshError::DegenerateFace`] if a triangle repeats a vertex
/// - [`MeshError::NonManifoldEdge`] if a directed edge appears twice
/// - [`MeshError::UnknownVertexReference`] for dangling inclusion/exclusion records
pub fn build_mesh(desc: &SurfaceDescription) -> Result<MembraneMesh> {
    if desc.triangles.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    let mut index_of: HashMap<i64, usize> = HashMap::with_capacity(desc.vertices.len());
    for (i, v) in desc.vertices.iter().enumerate() {
        if index_of.insert(v.id, i).is_some() {
            return Err(MeshError::DuplicateVertexId { id: v.id });
        }
    }

    let mut faces = Vec::with_capacity(desc.triangles.len());
    for t in &desc.triangles {
        let mut face = [0usize; 3];
        for (slot, &vid) in face.iter_mut().zip(t.vertices.iter()) {
            *slot = *index_of.get(&vid).ok_or(MeshError::InvalidVertexIndex {
                triangle: t.id,
                vertex: vid,
            })?;
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { triangle: t.id });
        }
        faces.push(face);
    }

    let vertices = desc
        .vertices
        .iter()
        .map(|v| Vertex::new(desc.pbc.wrap(&v.position), v.domain))
        .collect();
    let mut mesh = assemble(desc.pbc, vertices, &faces)?;

    for rec in &desc.inclusions {
        let &vi = index_of.get(&rec.vertex).ok_or(MeshError::UnknownVertexReference {
            kind: "inclusion",
            id: rec.id,
            vertex: rec.vertex,
        })?;
        let direction = unit_direction(rec.direction.x, rec.direction.y).unwrap_or_else(|| {
            warn!("inclusion {} has a zero direction, using (1, 0)", rec.id);
            Vector2::new(1.0, 0.0)
        });
        add_inclusion(&mut mesh, Inclusion::new(rec.type_id, VertexId::new(vi), direction))?;
    }

    for rec in &desc.exclusions {
        let &vi = index_of.get(&rec.vertex).ok_or(MeshError::UnknownVertexReference {
            kind: "exclusion",
            id: rec.id,
            vertex: rec.vertex,
        })?;
        mesh.exclusions
            .push(Exclusion::new(VertexId::new(vi), rec.radius));
    }

    Ok(mesh)
}

/// Build a mesh from positions and dense triangle indices.
///
/// Every vertex gets domain 0.
///
/// # Example
/// ```
/// use leaflet::mesh::{build_from_triangles, PeriodicBox};
/// use nalgebra::Point3;
///
/// let pbc = PeriodicBox::new(10.0, 10.0, 10.0).unwrap();
/// let vertices = vec![
///     Point3::new(1.0, 1.0, 5.0),
///     Point3::new(2.0, 1.0, 5.0),
///     Point3::new(1.5, 2.0, 5.0),
/// ];
/// let mesh = build_from_triangles(pbc, &vertices, &[[0, 1, 2]]).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_boundary_links(), 3);
/// ```
pub fn build_from_triangles(
    pbc: PeriodicBox,
    positions: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<MembraneMesh> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= positions.len() {
                return Err(MeshError::InvalidVertexIndex {
                    triangle: fi as i64,
                    vertex: vi as i64,
                });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { triangle: fi as i64 });
        }
    }

    let vertices = positions
        .iter()
        .map(|p| Vertex::new(pbc.wrap(p), 0))
        .collect();
    assemble(pbc, vertices, faces)
}

/// Wire up links, mirrors and vertex adjacency. Indices are already validated.
pub(crate) fn assemble(
    pbc: PeriodicBox,
    vertices: Vec<Vertex>,
    faces: &[[usize; 3]],
) -> Result<MembraneMesh> {
    let mut mesh = MembraneMesh::with_capacity(pbc, vertices.len(), faces.len());
    mesh.vertices = vertices;

    // Directed edge (v1, v2) -> link
    let mut edge_map: HashMap<(usize, usize), LinkId> = HashMap::with_capacity(faces.len() * 3);

    for (fi, face) in faces.iter().enumerate() {
        let tid = TriangleId::new(fi);
        let base = mesh.links.len();

        for k in 0..3 {
            let a = face[k];
            let b = face[(k + 1) % 3];
            let c = face[(k + 2) % 3];
            let lid = LinkId::new(base + k);

            let mut link = Link::new(VertexId::new(a), VertexId::new(b), VertexId::new(c), tid);
            link.neighbor1 = LinkId::new(base + (k + 1) % 3);
            link.neighbor2 = LinkId::new(base + (k + 2) % 3);

            // A second link on the same directed edge means either a
            // non-manifold edge or inconsistent orientation
            if edge_map.insert((a, b), lid).is_some() {
                return Err(MeshError::NonManifoldEdge { v0: a, v1: b });
            }
            mesh.links.push(link);

            let va = &mut mesh.vertices[a];
            va.add_link(lid);
            va.add_triangle(tid);
            va.add_neighbor(VertexId::new(b));
            mesh.vertices[b].add_neighbor(VertexId::new(a));
        }

        mesh.triangles.push(Triangle::new([
            VertexId::new(face[0]),
            VertexId::new(face[1]),
            VertexId::new(face[2]),
        ]));
    }

    // Link mirrors
    for (&(a, b), &lid) in &edge_map {
        if let Some(&mirror) = edge_map.get(&(b, a)) {
            let link = &mut mesh.links[lid.index()];
            link.mirror = Some(mirror);
            link.kind = LinkKind::Interior;
        }
    }

    debug!(
        "assembled mesh: {} vertices, {} triangles, {} links ({} boundary)",
        mesh.num_vertices(),
        mesh.num_triangles(),
        mesh.num_links(),
        mesh.num_boundary_links()
    );

    Ok(mesh)
}

/// Attach an inclusion to its vertex. A vertex holds at most one.
pub(crate) fn add_inclusion(mesh: &mut MembraneMesh, inclusion: Inclusion) -> Result<InclusionId> {
    let v = inclusion.vertex;
    if mesh.vertices[v.index()].inclusion.is_some() {
        return Err(MeshError::InvalidState(format!(
            "vertex {} already holds an inclusion",
            v
        )));
    }
    let id = InclusionId::new(mesh.inclusions.len());
    mesh.vertices[v.index()].inclusion = Some(id);
    mesh.inclusions.push(inclusion);
    Ok(id)
}

/// Convert a mesh back to a face-vertex representation.
///
/// Returns `(positions, faces)` with dense indices.
pub fn to_face_vertex(mesh: &MembraneMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let positions = mesh.vertices.iter().map(|v| v.position).collect();
    let faces = mesh
        .triangles
        .iter()
        .map(|t| {
            let [a, b, c] = t.vertices;
            [a.index(), b.index(), c.index()]
        })
        .collect();
    (positions, faces)
}
