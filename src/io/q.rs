//! `.q` surface format.
//!
//! ```text
//! Lx Ly Lz
//! N
//! id x y z ...
//! M
//! id v1 v2 v3 ...
//! ```
//!
//! Columns past the ones shown are ignored. Every vertex gets domain `0`.

use std::fs;
use std::path::Path;

use nalgebra::Point3;

use super::Records;
use crate::error::Result;
use crate::mesh::{PeriodicBox, SurfaceDescription, TriangleRecord, VertexRecord};

/// Load a surface description from a `.q` file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceDescription> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    parse(path, &text)
}

/// Parse `.q` text; `path` is used in error messages only.
pub fn parse(path: &Path, text: &str) -> Result<SurfaceDescription> {
    let mut records = Records::new(path, text);

    let header = records.expect("box")?;
    let pbc = PeriodicBox::new(
        header.field(0, "box x")?,
        header.field(1, "box y")?,
        header.field(2, "box z")?,
    )
    .map_err(|e| header.error(e.to_string()))?;

    let n: usize = records.expect("vertex count")?.field(0, "vertex count")?;
    let mut vertices = Vec::with_capacity(n.min(records.remaining()));
    for _ in 0..n {
        let r = records.expect("vertex")?;
        vertices.push(VertexRecord {
            id: r.field(0, "vertex id")?,
            position: Point3::new(r.field(1, "x")?, r.field(2, "y")?, r.field(3, "z")?),
            domain: 0,
        });
    }

    let m: usize = records.expect("triangle count")?.field(0, "triangle count")?;
    let mut triangles = Vec::with_capacity(m.min(records.remaining()));
    for _ in 0..m {
        let r = records.expect("triangle")?;
        triangles.push(TriangleRecord {
            id: r.field(0, "triangle id")?,
            vertices: [r.field(1, "v1")?, r.field(2, "v2")?, r.field(3, "v3")?],
        });
    }

    if let Some(extra) = records.next_record() {
        return Err(extra.error("unexpected data after the triangle list"));
    }

    Ok(SurfaceDescription::new(pbc, vertices, triangles))
}
