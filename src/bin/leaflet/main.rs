//! Leaflet CLI - turn membrane surfaces into bilayer point folders.
//!
//! Usage: leaflet <COMMAND> [OPTIONS] <INPUT>...
//!
//! Run `leaflet --help` for available commands.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use rayon::prelude::*;

use leaflet::algo::{FlipCriterion, FlipOptions, Layout, Progress, ProjectOptions};
use leaflet::nalgebra::Vector3;
use leaflet::pipeline::{self, PipelineOptions};

#[derive(Parser)]
#[command(name = "leaflet")]
#[command(author, version, about = "Membrane surface to bilayer point generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (overrides RUST_LOG)
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate leaflet point folders
    Plm {
        /// Input surface files (.tsi, .q, .ply)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output folder; one sub-folder per input when several are given
        #[arg(short, long, default_value = "point")]
        output: PathBuf,

        /// Bilayer thickness
        #[arg(short, long, default_value = "3.8")]
        thickness: f64,

        /// Number of subdivision iterations
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Rescale factors for x, y and z
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [1.0, 1.0, 1.0])]
        rescale: Vec<f64>,

        /// Single leaflet: 1 on the normal side, -1 on the other side
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        monolayer: i32,

        /// Run a flip pass after subdivision
        #[arg(long, value_enum)]
        flip: Option<FlipMethod>,

        /// Sweep limit for the flip pass
        #[arg(long, default_value = "50")]
        max_sweeps: usize,

        /// Process inputs one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Report mesh statistics without writing points
    Check {
        /// Input surface files (.tsi, .q, .ply)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Rescale factors for x, y and z
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [1.0, 1.0, 1.0])]
        rescale: Vec<f64>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FlipMethod {
    /// Flip towards a Delaunay triangulation
    Delaunay,
    /// Flip towards valence 6
    Valence,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logger(&resolve_log_level(cli.log_level));

    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn resolve_log_level(flag: Option<LogLevel>) -> String {
    if let Some(level) = flag {
        return level.as_str().to_string();
    }

    if let Ok(level) = std::env::var("RUST_LOG") {
        if !level.trim().is_empty() {
            return level;
        }
    }

    "info".to_string()
}

fn init_logger(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_filters(level);
    builder.format(|buf, record| {
        let module = record.module_path().unwrap_or(record.target());
        writeln!(
            buf,
            "{} [{}] {}: {}",
            buf.timestamp_millis(),
            record.level(),
            module,
            record.args()
        )
    });

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Plm {
            inputs,
            output,
            thickness,
            iterations,
            rescale,
            monolayer,
            flip,
            max_sweeps,
            sequential,
        } => {
            let mut options = PipelineOptions::default()
                .with_rescale(rescale_vector(&rescale)?)
                .with_iterations(iterations)
                .with_project(
                    ProjectOptions::new(thickness).with_layout(Layout::from_flag(monolayer)?),
                )
                .with_output(output);
            if let Some(method) = flip {
                let criterion = match method {
                    FlipMethod::Delaunay => FlipCriterion::Delaunay,
                    FlipMethod::Valence => FlipCriterion::Valence,
                };
                options = options.with_flip(FlipOptions::new(criterion).with_max_sweeps(max_sweeps));
            }
            cmd_plm(&inputs, &options, sequential)?;
        }

        Commands::Check { inputs, rescale } => {
            cmd_check(&inputs, &rescale_vector(&rescale)?)?;
        }
    }

    Ok(())
}

fn rescale_vector(values: &[f64]) -> Result<Vector3<f64>, Box<dyn std::error::Error>> {
    match values {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(format!("--rescale takes 3 values, got {}", values.len()).into()),
    }
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // monotonic, so parallel reporters never move the bar backwards
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }
        let percent = raw_percent.max(previous);

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_plm(
    inputs: &[PathBuf],
    options: &PipelineOptions,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let progress = create_progress();

    if let [input] = inputs {
        let report = pipeline::run(input, options, &progress)?;
        info!(
            "{}: {} outer / {} inner points in {} ({:.2?})",
            input.display(),
            report.outer_points,
            report.inner_points,
            options.output.display(),
            start.elapsed()
        );
        return Ok(());
    }

    let jobs: Vec<(PathBuf, PathBuf)> = inputs
        .iter()
        .cloned()
        .zip(pipeline::batch_outputs(&options.output, inputs)?)
        .collect();

    let done = AtomicUsize::new(0);
    let process = |(input, folder): &(PathBuf, PathBuf)| {
        let per_input = options.clone().with_output(folder.clone());
        let result = pipeline::run(input, &per_input, &Progress::none());
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        progress.report(n, inputs.len(), "Generating points");
        (input.clone(), per_input.output, result)
    };

    let mode = if sequential { "sequential" } else { "parallel" };
    info!("processing {} surfaces ({})", inputs.len(), mode);
    let results: Vec<_> = if sequential {
        jobs.iter().map(process).collect()
    } else {
        jobs.par_iter().map(process).collect()
    };

    let mut failed = 0;
    for (input, folder, result) in results {
        match result {
            Ok(report) => info!(
                "{}: {} outer / {} inner points in {}",
                input.display(),
                report.outer_points,
                report.inner_points,
                folder.display()
            ),
            Err(e) => {
                let kind = if e.is_topological() { "inconsistent surface" } else { "failed" };
                error!("{}: {}: {}", input.display(), kind, e);
                failed += 1;
            }
        }
    }
    info!("finished {} surfaces in {:.2?}", inputs.len(), start.elapsed());

    if failed > 0 {
        return Err(format!("{} of {} surfaces failed", failed, inputs.len()).into());
    }
    Ok(())
}

fn cmd_check(inputs: &[PathBuf], rescale: &Vector3<f64>) -> Result<(), Box<dyn std::error::Error>> {
    let mut failed = 0;
    for input in inputs {
        match pipeline::check(input, rescale) {
            Ok(stats) => {
                println!("File: {}", input.display());
                println!("{}", stats);
                println!();
            }
            Err(e) => {
                error!("{}: {}", input.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} surfaces failed the check", failed, inputs.len()).into());
    }
    Ok(())
}
