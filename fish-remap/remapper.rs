use fish_core::{FishError, FishResult, Image, RemapParams};

use crate::backend::RemapBackend;
use crate::orientation::rotate_clockwise_about_center;

/// A backend context bound to fixed geometry.
///
/// Construct through [`crate::RemapperBuilder`]. Each batch worker owns one
/// and reuses it for every image it converts.
pub struct Remapper {
    backend: Box<dyn RemapBackend>,
    params: RemapParams,
}

impl Remapper {
    pub fn new(backend: Box<dyn RemapBackend>, params: RemapParams) -> Self {
        Self { backend, params }
    }

    /// Projects an equirectangular image into an oriented fisheye image of the
    /// same dimensions. The input is not modified.
    pub fn remap(&self, source: &Image) -> FishResult<Image> {
        let (w, h) = source.dimensions();
        if w == 0 || h == 0 {
            return Err(FishError::DimensionMismatch {
                width: w,
                height: h,
                reason: "source image is empty",
            });
        }
        let projected = self.backend.project(source, &self.params)?;
        Ok(rotate_clockwise_about_center(&projected))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn params(&self) -> &RemapParams {
        &self.params
    }
}

impl std::fmt::Debug for Remapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remapper")
            .field("backend", &self.backend.name())
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuRemapper;
    use fish_core::Aperture;
    use image::Rgba;

    fn cpu(degrees: f32) -> Remapper {
        let params = RemapParams::equidistant(Aperture::from_degrees(degrees).unwrap());
        Remapper::new(Box::new(CpuRemapper::new()), params)
    }

    #[test]
    fn test_empty_source_rejected() {
        let err = cpu(180.0).remap(&Image::new(0, 0)).unwrap_err();
        assert!(matches!(err, FishError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_orientation_applied() {
        let src = Image::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let remapper = cpu(180.0);
        let projected = CpuRemapper::new().project(&src, remapper.params()).unwrap();
        let out = remapper.remap(&src).unwrap();
        assert_eq!(out, rotate_clockwise_about_center(&projected));
        assert_eq!(out.dimensions(), (64, 64));
    }

    #[test]
    fn test_single_pixel() {
        let src = Image::from_pixel(1, 1, Rgba([9, 8, 7, 255]));
        let out = cpu(180.0).remap(&src).unwrap();
        assert_eq!(out.dimensions(), (1, 1));
    }
}
