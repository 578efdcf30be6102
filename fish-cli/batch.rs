use crossbeam::queue::SegQueue;
use fish_assemble::assemble;
use fish_core::{FishError, FishResult, Image};
use fish_remap::{RemapConfig, Remapper, RemapperBuilder};
use image::{ImageFormat, ImageReader};
use std::collections::hash_map::{Entry, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::BatchConfig;
use crate::files::{list_source_files, output_paths, prepare_destination};
use crate::report::{BatchReport, FileFailure};
use crate::{BatchError, BatchResult};

/// Shared whole-batch stop flag.
///
/// Workers finish the file they hold and then stop claiming new ones.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What one worker hands back when it exits
struct WorkerOutcome {
    report: BatchReport,
    fatal: Option<FishError>,
}

/// Validated batch configuration plus its cancel token
pub struct BatchRunner {
    config: BatchConfig,
    cancel: CancelToken,
}

impl BatchRunner {
    /// Fails on invalid configuration (including the aperture) before any
    /// worker or compute context exists.
    pub fn new(config: BatchConfig) -> BatchResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Converts every file directly inside the source directory
    pub fn run(&self) -> BatchResult<BatchReport> {
        let files = list_source_files(&self.config.source_dir)?;
        prepare_destination(&self.config.dest_dir)?;
        if files.is_empty() {
            info!(source = %self.config.source_dir.display(), "no input files");
            return Ok(BatchReport::default());
        }
        self.run_files(&files)
    }

    /// Converts the given files (names relative to the source directory).
    ///
    /// Per-file failures are collected in the report. Failing to build a
    /// worker's compute context aborts the whole batch.
    pub fn run_files(&self, files: &[PathBuf]) -> BatchResult<BatchReport> {
        if files.is_empty() {
            return Ok(BatchReport::default());
        }
        prepare_destination(&self.config.dest_dir)?;

        let (queued, collisions) = partition_by_output(&self.config.dest_dir, files);
        for clash in &collisions {
            warn!(file = %clash.file.display(), error = %clash.error, "not converted");
        }
        if queued.is_empty() {
            return Ok(BatchReport { failed: collisions, ..Default::default() });
        }

        let queue = SegQueue::new();
        for file in &queued {
            queue.push(file.clone());
        }
        let halt = AtomicBool::new(false);
        let worker_count = self.config.workers.min(queued.len());

        info!(
            files = queued.len(),
            workers = worker_count,
            config = %self.config.summary(),
            "starting batch"
        );
        let started = Instant::now();

        let joined = thread::scope(|scope| -> BatchResult<Vec<thread::Result<WorkerOutcome>>> {
            let mut handles = Vec::with_capacity(worker_count);
            for id in 0..worker_count {
                let spawned = thread::Builder::new()
                    .name(format!("equ2fish-worker-{id}"))
                    .spawn_scoped(scope, {
                        let (queue, halt) = (&queue, &halt);
                        move || self.worker_loop(id, queue, halt)
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        halt.store(true, Ordering::SeqCst);
                        return Err(BatchError::WorkerSpawn(e));
                    }
                }
            }
            Ok(handles.into_iter().map(|h| h.join()).collect())
        })?;

        let mut report = BatchReport { failed: collisions, ..Default::default() };
        let mut fatal = None;
        for (worker, outcome) in joined.into_iter().enumerate() {
            let outcome = outcome.map_err(|_| BatchError::WorkerPanicked { worker })?;
            report.merge(outcome.report);
            if fatal.is_none() {
                fatal = outcome.fatal;
            }
        }
        if let Some(e) = fatal {
            error!(partial = %report.summary(), "batch aborted");
            return Err(e.into());
        }

        let mut skipped = Vec::new();
        while let Some(file) = queue.pop() {
            skipped.push(file);
        }
        if !skipped.is_empty() {
            warn!(skipped = skipped.len(), "batch cancelled before all files were claimed");
            skipped.sort();
            report.skipped.extend(skipped);
        }

        info!(
            elapsed = ?started.elapsed(),
            converted = report.converted,
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "batch finished"
        );
        Ok(report)
    }

    fn worker_loop(&self, id: usize, queue: &SegQueue<PathBuf>, halt: &AtomicBool) -> WorkerOutcome {
        let mut report = BatchReport::default();

        let remapper = match RemapperBuilder::from_config(self.config.remap.clone()).build() {
            Ok(r) => r,
            Err(e) => {
                error!(worker = id, error = %e, "failed to acquire compute context");
                halt.store(true, Ordering::SeqCst);
                return WorkerOutcome { report, fatal: Some(e) };
            }
        };
        info!(worker = id, backend = remapper.backend_name(), "worker ready");

        loop {
            if self.cancel.is_cancelled() || halt.load(Ordering::SeqCst) {
                break;
            }
            let Some(file) = queue.pop() else { break };

            match convert_file(&remapper, &self.config.source_dir, &self.config.dest_dir, &file) {
                Ok(()) => report.converted += 1,
                Err(error) => {
                    warn!(worker = id, file = %file.display(), %error, "conversion failed");
                    report.failed.push(FileFailure { file, error });
                }
            }
        }

        debug!(worker = id, converted = report.converted, "worker exiting");
        WorkerOutcome { report, fatal: None }
    }
}

/// Splits `files` into those to convert and those whose outputs would
/// overwrite an earlier file's (same stem, different extension).
fn partition_by_output(dest_dir: &Path, files: &[PathBuf]) -> (Vec<PathBuf>, Vec<FileFailure>) {
    let mut owners: HashMap<PathBuf, &PathBuf> = HashMap::new();
    let mut queued = Vec::with_capacity(files.len());
    let mut collisions = Vec::new();

    for file in files {
        let (out_1, _) = output_paths(dest_dir, file);
        match owners.entry(out_1) {
            Entry::Vacant(slot) => {
                slot.insert(file);
                queued.push(file.clone());
            }
            Entry::Occupied(slot) => collisions.push(FileFailure {
                file: file.clone(),
                error: FishError::Configuration(format!(
                    "outputs would overwrite those of {}",
                    slot.get().display()
                )),
            }),
        }
    }
    (queued, collisions)
}

/// Converts one composite frame into its two fisheye outputs
pub fn convert_file(
    remapper: &Remapper,
    source_dir: &Path,
    dest_dir: &Path,
    file: &Path,
) -> FishResult<()> {
    let path = source_dir.join(file);
    let started = Instant::now();

    let frame = ImageReader::open(&path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| FishError::io(&path, e))?
        .decode()?
        .into_rgba8();

    let halves = assemble(&frame)?;
    let fisheye_1 = remapper.remap(&halves.right)?;
    let fisheye_2 = remapper.remap(&halves.left)?;

    let (out_1, out_2) = output_paths(dest_dir, file);
    save_png(&fisheye_1, &out_1)?;
    save_png(&fisheye_2, &out_2)?;

    debug!(file = %file.display(), elapsed = ?started.elapsed(), "converted");
    Ok(())
}

fn save_png(img: &Image, path: &Path) -> FishResult<()> {
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Converts `files` from `source_dir` into `dest_dir` with `worker_count`
/// workers at the given aperture (radians), equidistant projection and
/// automatic backend selection.
pub fn run(
    files: &[PathBuf],
    worker_count: usize,
    aperture_radians: f32,
    source_dir: &Path,
    dest_dir: &Path,
) -> BatchResult<BatchReport> {
    let config = BatchConfig::new(source_dir, dest_dir)
        .with_workers(worker_count)
        .with_remap(RemapConfig::new(aperture_radians.to_degrees()));
    BatchRunner::new(config)?.run_files(files)
}
