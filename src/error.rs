//! Error types for leaflet.
//!
//! Every failure in the library is reported through [`MeshError`]. None of
//! them are retried: the transform is deterministic, so a failure on one input
//! always reproduces. Callers are expected to abort the current mesh
//! generation when they receive one.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while loading, assembling, editing or projecting a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// A periodic box dimension is not a positive finite number.
    #[error("invalid periodic box ({x}, {y}, {z}): every dimension must be positive")]
    InvalidBox {
        /// Box length along x.
        x: f64,
        /// Box length along y.
        y: f64,
        /// Box length along z.
        z: f64,
    },

    /// Two vertices share the same input id.
    #[error("vertex id {id} is defined more than once")]
    DuplicateVertexId {
        /// The repeated id.
        id: i64,
    },

    /// A triangle references a vertex id that does not exist.
    #[error("triangle {triangle} references unknown vertex id {vertex}")]
    InvalidVertexIndex {
        /// The triangle id (as given in the input).
        triangle: i64,
        /// The unknown vertex id.
        vertex: i64,
    },

    /// An inclusion or exclusion record references a vertex id that does not exist.
    #[error("{kind} {id} references unknown vertex id {vertex}")]
    UnknownVertexReference {
        /// Record kind, `"inclusion"` or `"exclusion"`.
        kind: &'static str,
        /// The record id (as given in the input).
        id: i64,
        /// The unknown vertex id.
        vertex: i64,
    },

    /// A triangle repeats one of its vertices.
    #[error("triangle {triangle} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The triangle id (as given in the input).
        triangle: i64,
    },

    /// An edge is shared by more than two triangles, or two triangles traverse
    /// it in the same direction.
    #[error("edge ({v0}, {v1}) is non-manifold")]
    NonManifoldEdge {
        /// First vertex index of the edge.
        v0: usize,
        /// Second vertex index of the edge.
        v1: usize,
    },

    /// A flip was requested on a link without a mirror.
    #[error("link {link} is a boundary link and cannot be flipped")]
    BoundaryFlip {
        /// The link index.
        link: usize,
    },

    /// A flip would create an edge that already exists.
    #[error("flipping link {link} would duplicate the existing edge ({v0}, {v1})")]
    FlipCreatesDuplicateEdge {
        /// The link index.
        link: usize,
        /// First vertex of the would-be edge.
        v0: usize,
        /// Second vertex of the would-be edge.
        v1: usize,
    },

    /// A triangle has a zero-length normal.
    #[error("triangle {triangle} has a zero-length normal")]
    DegenerateTriangle {
        /// The triangle index.
        triangle: usize,
    },

    /// The normals around a vertex cancel out.
    #[error("vertex {vertex} has a zero-length normal")]
    ZeroVertexNormal {
        /// The vertex index.
        vertex: usize,
    },

    /// The two triangle normals of an interior link cancel out.
    #[error("link {link} has a zero-length edge normal")]
    ZeroLinkNormal {
        /// The link index.
        link: usize,
    },

    /// The cosine between two adjacent triangle normals is far outside [-1, 1].
    #[error("link {link} has dihedral cosine {cosine}, which is beyond numerical noise")]
    DihedralOutOfRange {
        /// The link index.
        link: usize,
        /// The offending cosine.
        cosine: f64,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A malformed record in a textual mesh file.
    #[error("{path}:{line}: {message}")]
    ParseError {
        /// The file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Error message.
        message: String,
    },

    /// Error writing output files.
    #[error("failed to save to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a parse error for a line of a textual input file.
    pub fn parse<P: Into<PathBuf>, M: Into<String>>(path: P, line: usize, message: M) -> Self {
        MeshError::ParseError {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Whether the error signals broken topology or geometry rather than bad input.
    pub fn is_topological(&self) -> bool {
        matches!(
            self,
            MeshError::NonManifoldEdge { .. }
                | MeshError::BoundaryFlip { .. }
                | MeshError::FlipCreatesDuplicateEdge { .. }
                | MeshError::DegenerateTriangle { .. }
                | MeshError::ZeroVertexNormal { .. }
                | MeshError::ZeroLinkNormal { .. }
                | MeshError::DihedralOutOfRange { .. }
        )
    }
}
