//! Surface file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Triangulated surface | `.tsi` | ✓ | ✓ | Box, vertices, triangles, inclusions, exclusions |
//! | Q surface | `.q` | ✓ | ✗ | Box, vertices, triangles |
//! | PLY | `.ply` | ✓ | ✓ | No box; one is derived from the bounding extent |
//!
//! Projected leaflets are written as a point folder by [`points`].
//!
//! # Usage
//!
//! ```no_run
//! use leaflet::io::load;
//! use leaflet::mesh::build_mesh;
//!
//! let description = load("membrane.tsi").unwrap();
//! let mesh = build_mesh(&description).unwrap();
//! ```

pub mod ply;
pub mod points;
pub mod q;
pub mod tsi;

use std::path::Path;
use std::str::FromStr;

use crate::error::{MeshError, Result};
use crate::mesh::{MembraneMesh, SurfaceDescription};

/// Supported surface file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Triangulated surface with inclusions.
    Tsi,
    /// Q surface.
    Q,
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "tsi" => Some(Format::Tsi),
            "q" => Some(Format::Q),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a surface description with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceDescription> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Tsi => tsi::load(path),
        Format::Q => q::load(path),
        Format::Ply => ply::load(path),
    }
}

/// Save a mesh generation with automatic format detection.
pub fn save<P: AsRef<Path>>(mesh: &MembraneMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Tsi => tsi::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
        Format::Q => Err(MeshError::SaveError {
            path: path.to_path_buf(),
            message: "saving .q files is not supported".to_string(),
        }),
    }
}

/// Whitespace-separated records of a text file, blank lines skipped.
pub(crate) struct Records<'a> {
    path: &'a Path,
    lines: std::vec::IntoIter<Record<'a>>,
    last_line: usize,
}

/// One non-blank line split into fields.
pub(crate) struct Record<'a> {
    path: &'a Path,
    line: usize,
    fields: Vec<&'a str>,
}

impl<'a> Records<'a> {
    pub(crate) fn new(path: &'a Path, text: &'a str) -> Self {
        let lines: Vec<Record<'a>> = text
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                (!fields.is_empty()).then_some(Record {
                    path,
                    line: i + 1,
                    fields,
                })
            })
            .collect();
        Self {
            path,
            last_line: text.lines().count(),
            lines: lines.into_iter(),
        }
    }

    /// The next record, or a parse error naming what was expected.
    pub(crate) fn expect(&mut self, what: &str) -> Result<Record<'a>> {
        self.lines.next().ok_or_else(|| {
            MeshError::parse(
                self.path,
                self.last_line + 1,
                format!("unexpected end of file, expected {}", what),
            )
        })
    }

    /// Records not yet consumed. Caps reservations taken from header counts.
    pub(crate) fn remaining(&self) -> usize {
        self.lines.len()
    }

    /// The next record, if any.
    pub(crate) fn next_record(&mut self) -> Option<Record<'a>> {
        self.lines.next()
    }

    /// Read a `keyword count` header line.
    pub(crate) fn section(&mut self, keyword: &str) -> Result<usize> {
        let record = self.expect(keyword)?;
        record.keyword(keyword)?;
        record.field(1, "count")
    }
}

impl<'a> Record<'a> {
    /// First field, lowercased.
    pub(crate) fn head(&self) -> String {
        self.fields[0].to_lowercase()
    }

    pub(crate) fn error<M: Into<String>>(&self, message: M) -> MeshError {
        MeshError::parse(self.path, self.line, message)
    }

    /// Require the first field to be `keyword` (case-insensitive).
    pub(crate) fn keyword(&self, keyword: &str) -> Result<()> {
        if self.head() == keyword {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}', found '{}'",
                keyword, self.fields[0]
            )))
        }
    }

    /// Parse field `index`.
    pub(crate) fn field<T: FromStr>(&self, index: usize, name: &str) -> Result<T> {
        let raw = self
            .fields
            .get(index)
            .ok_or_else(|| self.error(format!("missing {}", name)))?;
        raw.parse()
            .map_err(|_| self.error(format!("invalid {} '{}'", name, raw)))
    }

    /// Parse field `index` if the line has it.
    pub(crate) fn optional_field<T: FromStr>(&self, index: usize, name: &str) -> Result<Option<T>> {
        if index < self.fields.len() {
            self.field(index, name).map(Some)
        } else {
            Ok(None)
        }
    }
}
