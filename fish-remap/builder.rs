use fish_core::{FishResult, FisheyeConfig, Projection};
use tracing::debug;

use crate::backend::{acquire_backend, BackendKind};
use crate::config::RemapConfig;
use crate::remapper::Remapper;

/// Fluent builder for a [`Remapper`]
#[derive(Debug, Clone)]
pub struct RemapperBuilder {
    aperture_degrees: f32,
    projection: Projection,
    backend: BackendKind,
}

impl Default for RemapperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RemapperBuilder {
    /// 180° equidistant, automatic backend selection
    pub fn new() -> Self {
        Self::from_config(RemapConfig::default())
    }

    /// Set the aperture in degrees, validated at build time
    pub fn aperture_degrees(mut self, degrees: f32) -> Self {
        self.aperture_degrees = degrees;
        self
    }

    pub fn aperture_radians(mut self, radians: f32) -> Self {
        self.aperture_degrees = radians.to_degrees();
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Apply the CPU-only preset, keeping the current geometry
    pub fn preset_cpu(mut self) -> Self {
        self.backend = BackendKind::Cpu;
        self
    }

    /// Apply the GPU preset, keeping the current geometry
    pub fn preset_gpu(mut self) -> Self {
        self.backend = BackendKind::Gpu;
        self
    }

    /// Validates the geometry, then acquires a fresh backend context.
    ///
    /// An invalid aperture fails before any device is touched.
    pub fn build(self) -> FishResult<Remapper> {
        let config = self.to_config();
        let params = config.core.params()?;
        let backend = acquire_backend(config.backend)?;
        debug!(backend = backend.name(), aperture = %params.aperture, "remapper built");
        Ok(Remapper::new(backend, params))
    }

    pub fn summary(&self) -> String {
        self.clone().to_config().summary()
    }

    pub fn from_config(config: RemapConfig) -> Self {
        Self {
            aperture_degrees: config.core.aperture_degrees,
            projection: config.core.projection,
            backend: config.backend,
        }
    }

    pub fn to_config(self) -> RemapConfig {
        RemapConfig {
            core: FisheyeConfig {
                aperture_degrees: self.aperture_degrees,
                projection: self.projection,
            },
            backend: self.backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fish_core::FishError;

    #[test]
    fn test_builder_roundtrips_config() {
        let config = RemapperBuilder::new()
            .aperture_degrees(210.0)
            .projection(Projection::Equisolid)
            .preset_cpu()
            .to_config();
        assert_eq!(config.core.aperture_degrees, 210.0);
        assert_eq!(config.core.projection, Projection::Equisolid);
        assert_eq!(config.backend, BackendKind::Cpu);
        assert_eq!(RemapperBuilder::from_config(config.clone()).to_config(), config);
    }

    #[test]
    fn test_invalid_aperture_fails_before_backend() {
        // Gpu would fail on adapter-less machines; the aperture check must come first
        let err = RemapperBuilder::new()
            .aperture_degrees(0.0)
            .preset_gpu()
            .build()
            .unwrap_err();
        assert!(matches!(err, FishError::InvalidAperture { .. }));
    }

    #[test]
    fn test_build_cpu() {
        let remapper = RemapperBuilder::new().aperture_degrees(190.0).preset_cpu().build().unwrap();
        assert_eq!(remapper.backend_name(), "cpu");
        assert!((remapper.params().aperture.degrees() - 190.0).abs() < 1e-3);
    }

    #[test]
    fn test_presets_keep_geometry() {
        let builder = RemapperBuilder::new()
            .aperture_degrees(200.0)
            .projection(Projection::Equisolid)
            .preset_gpu();
        assert_eq!(builder.clone().to_config().backend, BackendKind::Gpu);
        let config = builder.preset_cpu().to_config();
        assert_eq!(config.backend, BackendKind::Cpu);
        assert_eq!(config.core.aperture_degrees, 200.0);
        assert_eq!(config.core.projection, Projection::Equisolid);
    }

    #[test]
    fn test_summary() {
        let s = RemapperBuilder::new().backend(BackendKind::Gpu).summary();
        assert!(s.contains("gpu"));
        assert!(s.contains("180.0"));
    }
}
