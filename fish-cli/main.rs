use anyhow::Context;
use clap::Parser;
use fish_cli::{Aperture, BackendKind, BatchConfig, BatchError, BatchReport, BatchRunner, Projection};
use fish_core::init_thread_pool;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Converts dual-fisheye composite frames into pairs of fisheye images
#[derive(Parser, Debug)]
#[command(name = "equ2fish", version, about, long_about = None)]
struct Args {
    /// Source directory of the images to convert [default: imgs]
    #[arg(short, long)]
    src: Option<PathBuf>,

    /// Destination directory, created if absent [default: elaborated]
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Aperture of the images in degrees [default: 180]
    #[arg(short, long, value_name = "DEGREES")]
    apt: Option<String>,

    /// Number of parallel workers [default: 8]
    #[arg(short, long, value_name = "WORKERS")]
    prc: Option<usize>,

    /// TOML or JSON config file; explicit flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compute backend: cpu, gpu or auto [default: auto]
    #[arg(long)]
    backend: Option<BackendKind>,

    /// Radial projection model: equidistant or equisolid [default: equidistant]
    #[arg(long)]
    projection: Option<Projection>,

    /// Threads used by the CPU kernels [default: all logical CPUs]
    #[arg(long)]
    threads: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    /// Overlays explicit flags on `config`
    fn apply(&self, config: &mut BatchConfig) -> anyhow::Result<()> {
        if let Some(src) = &self.src {
            config.source_dir = src.clone();
        }
        if let Some(dest) = &self.dest {
            config.dest_dir = dest.clone();
        }
        if let Some(apt) = &self.apt {
            let aperture = Aperture::parse_degrees(apt)
                .with_context(|| format!("invalid --apt value '{apt}'"))?;
            config.remap.core.aperture_degrees = aperture.degrees();
        }
        if let Some(workers) = self.prc {
            config.workers = workers;
        }
        if let Some(backend) = self.backend {
            config.remap.backend = backend;
        }
        if let Some(projection) = self.projection {
            config.remap.core.projection = projection;
        }
        if self.threads.is_some() {
            config.cpu_threads = self.threads;
        }
        Ok(())
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = if verbose {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[cfg(feature = "serde")]
fn load_base_config(path: &Path) -> anyhow::Result<BatchConfig> {
    BatchConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))
}

#[cfg(not(feature = "serde"))]
fn load_base_config(path: &Path) -> anyhow::Result<BatchConfig> {
    anyhow::bail!(
        "cannot read {}: equ2fish was built without config file support",
        path.display()
    )
}

fn run(args: &Args) -> anyhow::Result<BatchReport> {
    let mut config = match &args.config {
        Some(path) => load_base_config(path)?,
        None => BatchConfig::default(),
    };
    args.apply(&mut config)?;

    let runner = BatchRunner::new(config)?;
    init_thread_pool(runner.config().kernel_threads()).map_err(BatchError::from)?;

    let token = runner.cancel_token();
    ctrlc::set_handler(move || {
        warn!("interrupt received, finishing files in progress");
        token.cancel();
    })
    .context("failed to install Ctrl-C handler")?;

    info!("{}", runner.config().summary());
    Ok(runner.run()?)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(report) => {
            println!("{}", report.summary());
            for failure in &report.failed {
                println!("  failed: {failure}");
            }
            if !report.failed.is_empty() {
                ExitCode::FAILURE
            } else if report.was_cancelled() {
                ExitCode::from(130)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
