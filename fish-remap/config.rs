use fish_core::{FishResult, FisheyeConfig, Projection};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::builder::RemapperBuilder;

/// Complete remapper configuration: geometry plus compute backend
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RemapConfig {
    /// Aperture and radial model
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub core: FisheyeConfig,
    pub backend: BackendKind,
}

impl RemapConfig {
    pub fn new(aperture_degrees: f32) -> Self {
        Self {
            core: FisheyeConfig {
                aperture_degrees,
                projection: Projection::Equidistant,
            },
            backend: BackendKind::Auto,
        }
    }

    /// Portable preset: CPU kernels only, never touches a GPU driver
    pub fn cpu_preset(aperture_degrees: f32) -> Self {
        Self {
            backend: BackendKind::Cpu,
            ..Self::new(aperture_degrees)
        }
    }

    /// GPU preset: adapter failure is fatal instead of falling back
    pub fn gpu_preset(aperture_degrees: f32) -> Self {
        Self {
            backend: BackendKind::Gpu,
            ..Self::new(aperture_degrees)
        }
    }

    pub fn to_builder(self) -> RemapperBuilder {
        RemapperBuilder::from_config(self)
    }

    pub fn summary(&self) -> String {
        format!(
            "RemapConfig: aperture={:.1}°, projection={}, backend={}",
            self.core.aperture_degrees, self.core.projection, self.backend
        )
    }

    pub fn validate(&self) -> FishResult<()> {
        self.core.aperture().map(|_| ())
    }
}
