use fish_core::{FishError, FishResult, Image, RemapParams};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cpu::CpuRemapper;

/// A compute device able to run the fisheye projection kernel.
///
/// Implementations produce the projected image *before* the orientation
/// correction; [`crate::Remapper`] applies that step for every backend.
pub trait RemapBackend: Send {
    fn name(&self) -> &str;

    /// Projects `source` into a fisheye image of the same dimensions.
    ///
    /// Callers guarantee non-zero dimensions.
    fn project(&self, source: &Image, params: &RemapParams) -> FishResult<Image>;
}

/// Which backend a worker should acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BackendKind {
    Cpu,
    Gpu,
    /// GPU when an adapter is available, CPU otherwise
    #[default]
    Auto,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cpu => f.write_str("cpu"),
            BackendKind::Gpu => f.write_str("gpu"),
            BackendKind::Auto => f.write_str("auto"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = FishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(BackendKind::Cpu),
            "gpu" => Ok(BackendKind::Gpu),
            "auto" => Ok(BackendKind::Auto),
            other => Err(FishError::Configuration(format!(
                "unknown backend '{other}' (expected 'cpu', 'gpu' or 'auto')"
            ))),
        }
    }
}

/// Builds a fresh backend of the requested kind.
///
/// GPU contexts are not shared: every caller gets its own device, queue and
/// compiled pipeline.
pub fn acquire_backend(kind: BackendKind) -> FishResult<Box<dyn RemapBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(CpuRemapper::new())),
        BackendKind::Gpu => acquire_gpu(),
        BackendKind::Auto => match acquire_gpu() {
            Ok(backend) => Ok(backend),
            Err(e) => {
                warn!(error = %e, "GPU unavailable, falling back to CPU remapping");
                Ok(Box::new(CpuRemapper::new()))
            }
        },
    }
}

#[cfg(feature = "gpu")]
fn acquire_gpu() -> FishResult<Box<dyn RemapBackend>> {
    Ok(Box::new(crate::gpu::GpuRemapper::new()?))
}

#[cfg(not(feature = "gpu"))]
fn acquire_gpu() -> FishResult<Box<dyn RemapBackend>> {
    Err(FishError::Device(
        "fish-remap was built without the `gpu` feature".to_string(),
    ))
}
