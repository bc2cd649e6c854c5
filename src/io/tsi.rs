//! `.tsi` triangulated surface format.
//!
//! ```text
//! version 1.1
//! box   10.0 10.0 10.0
//! vertex 3
//! 0  1.0 1.0 5.0  [domain]
//! ...
//! triangle 1
//! 0  0 1 2
//! inclusion 1
//! 0  type vertex lx ly
//! exclusion 1
//! 0  vertex radius
//! ```
//!
//! `version` is optional. The `inclusion` and `exclusion` sections are
//! optional and may come in either order after the triangles.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector2};

use super::Records;
use crate::error::{MeshError, Result};
use crate::mesh::{
    ExclusionRecord, InclusionRecord, MembraneMesh, PeriodicBox, SurfaceDescription,
    TriangleRecord, VertexRecord,
};

/// Load a surface description from a `.tsi` file.
///
/// # Example
///
/// ```no_run
/// use leaflet::io::tsi;
///
/// let description = tsi::load("membrane.tsi").unwrap();
/// println!("{} vertices", description.vertices.len());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceDescription> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    parse(path, &text)
}

/// Parse `.tsi` text; `path` is used in error messages only.
pub fn parse(path: &Path, text: &str) -> Result<SurfaceDescription> {
    let mut records = Records::new(path, text);

    let mut header = records.expect("box")?;
    if header.head() == "version" {
        header = records.expect("box")?;
    }
    header.keyword("box")?;
    let pbc = PeriodicBox::new(
        header.field(1, "box x")?,
        header.field(2, "box y")?,
        header.field(3, "box z")?,
    )
    .map_err(|e| header.error(e.to_string()))?;

    let n = records.section("vertex")?;
    let mut vertices = Vec::with_capacity(n.min(records.remaining()));
    for _ in 0..n {
        let r = records.expect("vertex")?;
        vertices.push(VertexRecord {
            id: r.field(0, "vertex id")?,
            position: Point3::new(r.field(1, "x")?, r.field(2, "y")?, r.field(3, "z")?),
            domain: r.optional_field(4, "domain")?.unwrap_or(0),
        });
    }

    let m = records.section("triangle")?;
    let mut triangles = Vec::with_capacity(m.min(records.remaining()));
    for _ in 0..m {
        let r = records.expect("triangle")?;
        triangles.push(TriangleRecord {
            id: r.field(0, "triangle id")?,
            vertices: [r.field(1, "v1")?, r.field(2, "v2")?, r.field(3, "v3")?],
        });
    }

    let mut description = SurfaceDescription::new(pbc, vertices, triangles);

    while let Some(section) = records.next_record() {
        let count: usize = section.field(1, "count")?;
        match section.head().as_str() {
            "inclusion" => {
                for _ in 0..count {
                    let r = records.expect("inclusion")?;
                    description.inclusions.push(InclusionRecord {
                        id: r.field(0, "inclusion id")?,
                        type_id: r.field(1, "inclusion type")?,
                        vertex: r.field(2, "vertex id")?,
                        direction: Vector2::new(r.field(3, "lx")?, r.field(4, "ly")?),
                    });
                }
            }
            "exclusion" => {
                for _ in 0..count {
                    let r = records.expect("exclusion")?;
                    description.exclusions.push(ExclusionRecord {
                        id: r.field(0, "exclusion id")?,
                        vertex: r.field(1, "vertex id")?,
                        radius: r.field(2, "radius")?,
                    });
                }
            }
            other => {
                return Err(section.error(format!("unknown section '{}'", other)));
            }
        }
    }

    Ok(description)
}

/// Save a mesh generation as `.tsi`.
///
/// Vertex ids are the generation's dense indices; inclusion directions are
/// written in each vertex's local frame.
pub fn save<P: AsRef<Path>>(mesh: &MembraneMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}

fn write<W: Write>(mesh: &MembraneMesh, w: &mut W) -> std::io::Result<()> {
    let l = mesh.pbc().lengths();
    writeln!(w, "version 1.1")?;
    writeln!(w, "box {:>12.6} {:>12.6} {:>12.6}", l.x, l.y, l.z)?;

    writeln!(w, "vertex {}", mesh.num_vertices())?;
    for (id, v) in mesh.vertices() {
        let p = v.position();
        writeln!(
            w,
            "{:>8} {:>12.6} {:>12.6} {:>12.6} {:>4}",
            id.index(),
            p.x,
            p.y,
            p.z,
            v.domain()
        )?;
    }

    writeln!(w, "triangle {}", mesh.num_triangles())?;
    for (id, t) in mesh.triangles() {
        let [a, b, c] = t.vertices();
        writeln!(
            w,
            "{:>8} {:>8} {:>8} {:>8}",
            id.index(),
            a.index(),
            b.index(),
            c.index()
        )?;
    }

    if !mesh.inclusions().is_empty() {
        writeln!(w, "inclusion {}", mesh.inclusions().len())?;
        for (i, inc) in mesh.inclusions().iter().enumerate() {
            let d = inc.direction();
            writeln!(
                w,
                "{:>8} {:>4} {:>8} {:>10.6} {:>10.6}",
                i,
                inc.type_id(),
                inc.vertex().index(),
                d.x,
                d.y
            )?;
        }
    }

    if !mesh.exclusions().is_empty() {
        writeln!(w, "exclusion {}", mesh.exclusions().len())?;
        for (i, exc) in mesh.exclusions().iter().enumerate() {
            writeln!(
                w,
                "{:>8} {:>8} {:>10.6}",
                i,
                exc.vertex().index(),
                exc.radius()
            )?;
        }
    }

    w.flush()
}
