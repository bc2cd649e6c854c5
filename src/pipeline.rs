//! End-to-end point generation.
//!
//! [`run`] takes one surface file through every stage: load, rescale,
//! assemble, geometry, subdivision, optional flip pass, projection and the
//! point folder. [`check`] stops after the geometry pass and reports what it
//! found.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};
use nalgebra::Vector3;

use crate::algo::{
    flip_pass, project, subdivide, update_geometry, FlipOptions, Progress, ProjectOptions,
    SubdivideOptions,
};
use crate::error::{MeshError, Result};
use crate::io;
use crate::mesh::{build_mesh, MembraneMesh};

/// Options for [`run`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Per-axis factor applied to the box and positions before assembly.
    pub rescale: Vector3<f64>,
    /// Subdivision settings.
    pub subdivide: SubdivideOptions,
    /// Flip pass after subdivision; `None` skips it.
    pub flip: Option<FlipOptions>,
    /// Projection settings.
    pub project: ProjectOptions,
    /// Point folder.
    pub output: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            rescale: Vector3::new(1.0, 1.0, 1.0),
            subdivide: SubdivideOptions::default(),
            flip: None,
            project: ProjectOptions::default(),
            output: PathBuf::from("point"),
        }
    }
}

impl PipelineOptions {
    /// Set the rescale factors.
    pub fn with_rescale(mut self, rescale: Vector3<f64>) -> Self {
        self.rescale = rescale;
        self
    }

    /// Set the number of subdivision iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.subdivide = self.subdivide.with_iterations(iterations);
        self
    }

    /// Enable a flip pass.
    pub fn with_flip(mut self, flip: FlipOptions) -> Self {
        self.flip = Some(flip);
        self
    }

    /// Set the projection options.
    pub fn with_project(mut self, project: ProjectOptions) -> Self {
        self.project = project;
        self
    }

    /// Set the point folder.
    pub fn with_output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = output.into();
        self
    }
}

/// What [`run`] produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Vertices of the final generation.
    pub vertices: usize,
    /// Triangles of the final generation.
    pub triangles: usize,
    /// Edge flips performed.
    pub flips: usize,
    /// Points in the upper (or single) leaflet.
    pub outer_points: usize,
    /// Points in the lower leaflet.
    pub inner_points: usize,
    /// Files written.
    pub files: Vec<PathBuf>,
}

const STAGES: usize = 5;

/// Load, rescale and assemble a surface file, then run the geometry pass.
pub fn prepare<P: AsRef<Path>>(input: P, rescale: &Vector3<f64>) -> Result<MembraneMesh> {
    let input = input.as_ref();
    let mut description = io::load(input)?;
    if *rescale != Vector3::new(1.0, 1.0, 1.0) {
        description.rescale(rescale)?;
    }
    let mut mesh = build_mesh(&description)?;
    update_geometry(&mut mesh)?;
    info!(
        "{}: {} vertices, {} triangles, {} boundary links",
        input.display(),
        mesh.num_vertices(),
        mesh.num_triangles(),
        mesh.num_boundary_links()
    );
    Ok(mesh)
}

/// Generate the point folder for one surface file.
///
/// # Example
///
/// ```no_run
/// use leaflet::algo::Progress;
/// use leaflet::pipeline::{run, PipelineOptions};
///
/// let options = PipelineOptions::default().with_iterations(2).with_output("point");
/// let report = run("membrane.tsi", &options, &Progress::none()).unwrap();
/// println!("{} upper leaflet points", report.outer_points);
/// ```
pub fn run<P: AsRef<Path>>(
    input: P,
    options: &PipelineOptions,
    progress: &Progress,
) -> Result<PipelineReport> {
    progress.report(0, STAGES, "Loading");
    let mesh = prepare(input, &options.rescale)?;

    progress.report(1, STAGES, "Subdividing");
    let mut mesh = subdivide(&mesh, &options.subdivide)?;

    progress.report(2, STAGES, "Flipping");
    let flips = match &options.flip {
        Some(flip) => {
            let n = flip_pass(&mut mesh, flip)?;
            info!("flip pass: {} edges flipped", n);
            n
        }
        None => 0,
    };

    progress.report(3, STAGES, "Projecting");
    let bilayer = project(&mesh, &options.project)?;
    if !mesh.is_closed() {
        warn!(
            "surface is open: {} boundary links",
            mesh.num_boundary_links()
        );
    }

    progress.report(4, STAGES, "Writing");
    let files = io::points::write_folder(&bilayer, &options.output)?;
    progress.report(STAGES, STAGES, "Done");

    Ok(PipelineReport {
        vertices: mesh.num_vertices(),
        triangles: mesh.num_triangles(),
        flips,
        outer_points: bilayer.outer.len(),
        inner_points: bilayer.inner.len(),
        files,
    })
}

/// One point folder per input: `<output>/<input stem>`.
///
/// Fails with [`MeshError::InvalidParameter`] naming both inputs when two of
/// them would share a folder, as `a/mem.tsi` and `b/mem.tsi` or `mem.tsi` and
/// `mem.q` do.
pub fn batch_outputs(output: &Path, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut owners: HashMap<PathBuf, &Path> = HashMap::with_capacity(inputs.len());
    let mut folders = Vec::with_capacity(inputs.len());
    for input in inputs {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "surface".to_string());
        let folder = output.join(stem);
        if let Some(first) = owners.insert(folder.clone(), input.as_path()) {
            return Err(MeshError::invalid_param(
                "inputs",
                format!(
                    "{} and {} both write to {}",
                    first.display(),
                    input.display(),
                    folder.display()
                ),
                "inputs of a batch need distinct file stems",
            ));
        }
        folders.push(folder);
    }
    Ok(folders)
}

/// Summary of one mesh generation.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshStats {
    /// Vertex count.
    pub vertices: usize,
    /// Triangle count.
    pub triangles: usize,
    /// Undirected edge count.
    pub edges: usize,
    /// Links without a mirror.
    pub boundary_links: usize,
    /// `V - E + T`.
    pub euler_characteristic: i64,
    /// Total triangle area.
    pub area: f64,
    /// Box lengths.
    pub box_lengths: Vector3<f64>,
    /// Smallest `c2` and largest `c1`.
    pub curvature_range: Option<(f64, f64)>,
    /// `Σ c1 c2 A` over all vertices.
    pub total_gaussian_curvature: f64,
    /// Whether every connectivity invariant holds.
    pub valid: bool,
}

impl MeshStats {
    /// Collect statistics from a mesh with up-to-date geometry.
    pub fn of(mesh: &MembraneMesh) -> Self {
        Self {
            vertices: mesh.num_vertices(),
            triangles: mesh.num_triangles(),
            edges: mesh.num_edges(),
            boundary_links: mesh.num_boundary_links(),
            euler_characteristic: mesh.euler_characteristic(),
            area: mesh.surface_area(),
            box_lengths: *mesh.pbc().lengths(),
            curvature_range: mesh.curvature_range(),
            total_gaussian_curvature: mesh.total_gaussian_curvature(),
            valid: mesh.is_valid(),
        }
    }
}

impl fmt::Display for MeshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vertices: {}", self.vertices)?;
        writeln!(f, "Triangles: {}", self.triangles)?;
        writeln!(f, "Edges: {}", self.edges)?;
        writeln!(f, "Boundary links: {}", self.boundary_links)?;
        writeln!(f, "Euler characteristic: {}", self.euler_characteristic)?;
        writeln!(f, "Surface area: {:.6}", self.area)?;
        writeln!(
            f,
            "Box: {:.3} x {:.3} x {:.3}",
            self.box_lengths.x, self.box_lengths.y, self.box_lengths.z
        )?;
        if let Some((lo, hi)) = self.curvature_range {
            writeln!(f, "Curvature range: [{:.4}, {:.4}]", lo, hi)?;
        }
        writeln!(f, "Total Gaussian curvature: {:.4}", self.total_gaussian_curvature)?;
        write!(f, "Connectivity: {}", if self.valid { "valid" } else { "BROKEN" })
    }
}

/// Load a surface file and report its statistics without writing points.
///
/// Fails with [`MeshError::InvalidState`] when the assembled mesh breaks a
/// connectivity invariant.
pub fn check<P: AsRef<Path>>(input: P, rescale: &Vector3<f64>) -> Result<MeshStats> {
    let mesh = prepare(input, rescale)?;
    let stats = MeshStats::of(&mesh);
    if !stats.valid {
        return Err(MeshError::InvalidState(
            "assembled mesh fails connectivity validation".to_string(),
        ));
    }
    Ok(stats)
}
