//! Batch conversion of dual-fisheye composite frames.
//!
//! Every file in the source directory is split into its two sensor images,
//! each image is remapped to a fisheye projection and the pair is written as
//! `<stem>_1.png` and `<stem>_2.png`. Files are spread over a fixed pool of
//! worker threads; each worker owns its own compute context.

pub mod batch;
pub mod config;
pub mod files;
pub mod report;

pub use batch::{convert_file, run, BatchRunner, CancelToken};
pub use config::BatchConfig;
pub use files::{list_source_files, output_paths, prepare_destination};
pub use report::{BatchReport, FileFailure};

pub use fish_core::{self, Aperture, FishError, FishResult, Projection};
pub use fish_remap::{self, BackendKind, RemapConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Fish(#[from] FishError),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

pub type BatchResult<T> = Result<T, BatchError>;
