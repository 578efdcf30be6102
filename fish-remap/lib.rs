//! Equirectangular to fisheye remapping.
//!
//! Every destination pixel inside the inscribed circle is traced back to a
//! direction on the sphere and sampled bilinearly from the equirectangular
//! source; pixels outside the circle are transparent. The projected image is
//! then turned 90° clockwise about its centre.
//!
//! ```no_run
//! use fish_remap::{BackendKind, RemapperBuilder};
//!
//! let remapper = RemapperBuilder::new()
//!     .aperture_degrees(195.0)
//!     .backend(BackendKind::Auto)
//!     .build()?;
//! let equirect = image::open("pano.png").map_err(fish_core::FishError::from)?.into_rgba8();
//! let fisheye = remapper.remap(&equirect)?;
//! # Ok::<(), fish_core::FishError>(())
//! ```

pub mod backend;
pub mod builder;
pub mod config;
pub mod cpu;
pub mod geometry;
pub mod orientation;
pub mod remapper;
pub mod sampling;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use backend::{acquire_backend, BackendKind, RemapBackend};
pub use builder::RemapperBuilder;
pub use config::RemapConfig;
pub use cpu::CpuRemapper;
pub use remapper::Remapper;

#[cfg(feature = "gpu")]
pub use gpu::GpuRemapper;

use fish_core::{Aperture, FishResult, Image, RemapParams};

/// One-shot equidistant remap on the CPU.
///
/// Fails with `InvalidAperture` unless `aperture_radians` is in (0, 2π].
pub fn remap(source: &Image, aperture_radians: f32) -> FishResult<Image> {
    let params = RemapParams::equidistant(Aperture::from_radians(aperture_radians)?);
    Remapper::new(Box::new(CpuRemapper::new()), params).remap(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fish_core::FishError;
    use image::Rgba;
    use std::f32::consts::PI;

    #[test]
    fn test_remap_rejects_bad_aperture() {
        let src = Image::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        assert!(matches!(remap(&src, 0.0), Err(FishError::InvalidAperture { .. })));
        assert!(matches!(remap(&src, -1.0), Err(FishError::InvalidAperture { .. })));
        assert!(matches!(remap(&src, 7.0), Err(FishError::InvalidAperture { .. })));
    }

    #[test]
    fn test_remap_uniform_square() {
        let src = Image::from_pixel(800, 800, Rgba([40, 80, 120, 255]));
        let out = remap(&src, PI).unwrap();
        assert_eq!(out.dimensions(), (800, 800));
        assert_eq!(out.get_pixel(400, 400), &Rgba([40, 80, 120, 255]));
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(out.get_pixel(799, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_remap_full_sphere() {
        let src = Image::from_pixel(64, 32, Rgba([7, 7, 7, 255]));
        let out = remap(&src, 2.0 * PI).unwrap();
        assert_eq!(out.dimensions(), (64, 32));
    }
}
