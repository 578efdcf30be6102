use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors shared by every stage of the conversion pipeline.
#[derive(Debug, Error)]
pub enum FishError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid aperture: {value} rad (must be in (0, 2π])")]
    InvalidAperture { value: f32 },

    #[error("dimension mismatch: {width}x{height} image ({reason})")]
    DimensionMismatch {
        width: u32,
        height: u32,
        reason: &'static str,
    },

    #[error("device error: {0}")]
    Device(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

impl FishError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        FishError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type FishResult<T> = Result<T, FishError>;
