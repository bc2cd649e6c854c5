//! PLY (Stanford polygon) format support.
//!
//! PLY files carry no periodic box. On load the box is set to twice the
//! bounding extent on each axis, never less than [`MIN_PLY_BOX`], and the
//! surface is translated so that its bounding box sits in the middle.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use nalgebra::{Point3, Vector3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::{to_face_vertex, MembraneMesh, PeriodicBox, SurfaceDescription, TriangleRecord, VertexRecord};

/// Smallest box length derived for a PLY surface.
pub const MIN_PLY_BOX: f64 = 10.0;

/// Load a surface description from a PLY file.
///
/// Polygons with more than three corners are fan-triangulated.
///
/// # Example
///
/// ```no_run
/// use leaflet::io::ply;
///
/// let description = ply::load("vesicle.ply").unwrap();
/// println!("box {:?}", description.pbc.lengths());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceDescription> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(&mut reader).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let load_error = |message: &str| MeshError::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let mut positions: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let x = get_float_property(vertex, "x").ok_or_else(|| load_error("vertex missing x coordinate"))?;
        let y = get_float_property(vertex, "y").ok_or_else(|| load_error("vertex missing y coordinate"))?;
        let z = get_float_property(vertex, "z").ok_or_else(|| load_error("vertex missing z coordinate"))?;
        positions.push(Point3::new(x, y, z));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element"))?;

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property"))?;

        for i in 1..indices.len().saturating_sub(1) {
            faces.push([indices[0], indices[i], indices[i + 1]]);
        }
    }

    if faces.is_empty() {
        return Err(load_error("PLY file contains no faces"));
    }

    let (pbc, shift) = enclosing_box(&positions)?;
    debug!("derived box {:?} for {}", pbc.lengths(), path.display());

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, p)| VertexRecord {
            id: i as i64,
            position: p + shift,
            domain: 0,
        })
        .collect();
    let triangles = faces
        .iter()
        .enumerate()
        .map(|(i, f)| TriangleRecord {
            id: i as i64,
            vertices: [f[0] as i64, f[1] as i64, f[2] as i64],
        })
        .collect();

    Ok(SurfaceDescription::new(pbc, vertices, triangles))
}

/// Box twice the bounding extent (at least [`MIN_PLY_BOX`]) and the
/// translation that centres the points in it.
fn enclosing_box(positions: &[Point3<f64>]) -> Result<(PeriodicBox, Vector3<f64>)> {
    let first = positions.first().ok_or(MeshError::EmptyMesh)?;
    let (lo, hi) = positions.iter().fold((*first, *first), |(lo, hi), p| {
        (lo.inf(p), hi.sup(p))
    });
    let extent = hi - lo;
    let lengths = extent.map(|e| (2.0 * e).max(MIN_PLY_BOX));
    let centre = lo + extent * 0.5;
    let shift = lengths * 0.5 - centre.coords;
    Ok((PeriodicBox::from_lengths(lengths)?, shift))
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh generation to an ASCII PLY file.
///
/// Positions are written wrapped into the box; triangles spanning a box
/// face will look stretched in a viewer.
pub fn save<P: AsRef<Path>>(mesh: &MembraneMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by leaflet")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    for f in &faces {
        writeln!(writer, "3 {} {} {}", f[0], f[1], f[2])?;
    }

    writer.flush()?;
    Ok(())
}
