//! Point folder output.
//!
//! A projected [`Bilayer`] is written as a folder of fixed-width text files:
//!
//! - `OuterBM.dat`: box line, then the upper (or single) leaflet
//! - `InnerBM.dat`: the lower leaflet, bilayers only
//! - `IncData.dat`: inclusions, when there are any
//! - `ExcData.dat`: exclusions, when there are any
//!
//! Point rows hold `id domain area X Y Z Nx Ny Nz P1x P1y P1z P2x P2y P2z C1
//! C2 vtype`, where `vtype` is `1` for points generated from boundary
//! vertices.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::algo::{Bilayer, LeafletPoint, PointExclusion, PointInclusion};
use crate::error::{MeshError, Result};

/// Upper leaflet file name.
pub const OUTER_FILE: &str = "OuterBM.dat";
/// Lower leaflet file name.
pub const INNER_FILE: &str = "InnerBM.dat";
/// Inclusion file name.
pub const INCLUSION_FILE: &str = "IncData.dat";
/// Exclusion file name.
pub const EXCLUSION_FILE: &str = "ExcData.dat";

/// Write a point folder, creating `dir` if needed. Returns the files written.
///
/// # Example
///
/// ```no_run
/// use leaflet::algo::{project, update_geometry, ProjectOptions};
/// use leaflet::io::{load, points};
/// use leaflet::mesh::build_mesh;
///
/// let mut mesh = build_mesh(&load("membrane.tsi").unwrap()).unwrap();
/// update_geometry(&mut mesh).unwrap();
/// let bilayer = project(&mesh, &ProjectOptions::default()).unwrap();
/// points::write_folder(&bilayer, "point").unwrap();
/// ```
pub fn write_folder<P: AsRef<Path>>(bilayer: &Bilayer, dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let outer = dir.join(OUTER_FILE);
    write_file(&outer, |w| write_leaflet(w, bilayer, &bilayer.outer, true))?;
    written.push(outer);

    if !bilayer.monolayer {
        let inner = dir.join(INNER_FILE);
        write_file(&inner, |w| write_leaflet(w, bilayer, &bilayer.inner, false))?;
        written.push(inner);
    }

    if !bilayer.inclusions.is_empty() {
        let path = dir.join(INCLUSION_FILE);
        write_file(&path, |w| write_inclusions(w, &bilayer.inclusions))?;
        written.push(path);
    }

    if !bilayer.exclusions.is_empty() {
        let path = dir.join(EXCLUSION_FILE);
        write_file(&path, |w| write_exclusions(w, &bilayer.exclusions))?;
        written.push(path);
    }

    info!(
        "wrote {} outer and {} inner points to {}",
        bilayer.outer.len(),
        bilayer.inner.len(),
        dir.display()
    );
    Ok(written)
}

fn write_file<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let save_error = |e: std::io::Error| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let file = File::create(path).map_err(save_error)?;
    let mut writer = BufWriter::new(file);
    body(&mut writer).map_err(save_error)?;
    writer.flush().map_err(save_error)
}

fn write_leaflet<W: Write>(
    w: &mut W,
    bilayer: &Bilayer,
    points: &[LeafletPoint],
    outer: bool,
) -> std::io::Result<()> {
    if outer {
        let l = bilayer.pbc.lengths();
        writeln!(w, "Box     {:.3}     {:.3}     {:.3}", l.x, l.y, l.z)?;
    }
    writeln!(w, "< Point NoPoints     {}>", points.len())?;
    writeln!(
        w,
        "< id domain_id area X Y Z Nx Ny Nz P1x P1y P1z P2x P2y P2z C1 C2 vtype >"
    )?;
    writeln!(w, "< {} >", if outer { "Outer" } else { "Inner" })?;
    for p in points {
        write_point(w, p)?;
    }
    Ok(())
}

fn write_point<W: Write>(w: &mut W, p: &LeafletPoint) -> std::io::Result<()> {
    write!(w, "{:>10} {:>4} {:>9.3}", p.id, p.domain, p.area)?;
    for x in p.position.iter() {
        write!(w, " {:>9.3}", x)?;
    }
    for x in p.normal.iter().chain(p.p1.iter()).chain(p.p2.iter()) {
        write!(w, " {:>7.3}", x)?;
    }
    writeln!(
        w,
        " {:>7.3} {:>7.3} {:>9}",
        p.c1,
        p.c2,
        u8::from(p.on_boundary)
    )
}

fn write_inclusions<W: Write>(w: &mut W, inclusions: &[PointInclusion]) -> std::io::Result<()> {
    writeln!(w, "< Inclusion NoInc {} >", inclusions.len())?;
    writeln!(w, "< id typeid pointid lx ly lz >")?;
    for inc in inclusions {
        let d = &inc.direction;
        writeln!(
            w,
            "{:>12} {:>12} {:>12} {:>8.3} {:>8.3} {:>8.3}",
            inc.id, inc.type_id, inc.point, d.x, d.y, d.z
        )?;
    }
    Ok(())
}

fn write_exclusions<W: Write>(w: &mut W, exclusions: &[PointExclusion]) -> std::io::Result<()> {
    writeln!(w, "< Exclusion NoExc {} >", exclusions.len())?;
    writeln!(w, "< id typeid radius >")?;
    for exc in exclusions {
        writeln!(w, "{:>12} {:>12} {:>12.3}", exc.id, exc.point, exc.radius)?;
    }
    Ok(())
}
