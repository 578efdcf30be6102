use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod error;

pub use error::{FishError, FishResult};

/// Row-major RGBA8 image, origin top-left, no row padding
pub type Image = image::RgbaImage;

/// Angular field of view covered by the fisheye circle, in radians.
///
/// Always within (0, 2π]; construct through [`Aperture::from_radians`] or
/// [`Aperture::from_degrees`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Aperture(f32);

impl Aperture {
    /// Slack for degree inputs like 360° whose f32 conversion lands just past 2π.
    const ROUNDING_SLACK: f32 = 1e-5;

    pub fn from_radians(value: f32) -> FishResult<Self> {
        if !value.is_finite() || value <= 0.0 || value > TAU + Self::ROUNDING_SLACK {
            return Err(FishError::InvalidAperture { value });
        }
        Ok(Self(value.min(TAU)))
    }

    pub fn from_degrees(degrees: f32) -> FishResult<Self> {
        Self::from_radians(degrees.to_radians())
    }

    /// Parses a degree value as typed on the command line
    pub fn parse_degrees(text: &str) -> FishResult<Self> {
        let degrees = text
            .trim()
            .parse::<f32>()
            .map_err(|_| FishError::InvalidAperture { value: f32::NAN })?;
        Self::from_degrees(degrees)
    }

    pub fn radians(self) -> f32 {
        self.0
    }

    pub fn degrees(self) -> f32 {
        self.0.to_degrees()
    }
}

impl fmt::Display for Aperture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.degrees())
    }
}

/// Radial model mapping normalised fisheye radius to angle off the optical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Projection {
    /// φ = r · aperture / 2
    #[default]
    Equidistant,
    /// φ = 2 · asin(r · sin(aperture / 4))
    Equisolid,
}

impl Projection {
    /// Polar angle for a normalised radius `r` in [0, 1].
    ///
    /// Both models give φ(0) = 0 and φ(1) = aperture / 2.
    #[inline]
    pub fn polar_angle(self, r: f32, aperture: Aperture) -> f32 {
        let a = aperture.radians();
        match self {
            Projection::Equidistant => r * a * 0.5,
            Projection::Equisolid => 2.0 * (r * (a * 0.25).sin()).clamp(-1.0, 1.0).asin(),
        }
    }

    /// Identifier understood by the compute kernel.
    pub fn kernel_id(self) -> u32 {
        match self {
            Projection::Equidistant => 0,
            Projection::Equisolid => 1,
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Equidistant => f.write_str("equidistant"),
            Projection::Equisolid => f.write_str("equisolid"),
        }
    }
}

impl FromStr for Projection {
    type Err = FishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equidistant" => Ok(Projection::Equidistant),
            "equisolid" | "equisolid-angle" => Ok(Projection::Equisolid),
            other => Err(FishError::Configuration(format!(
                "unknown projection '{other}' (expected 'equidistant' or 'equisolid')"
            ))),
        }
    }
}

/// Validated per-image parameters handed to every remap call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemapParams {
    pub aperture: Aperture,
    pub projection: Projection,
}

impl RemapParams {
    pub fn new(aperture: Aperture, projection: Projection) -> Self {
        Self { aperture, projection }
    }

    pub fn equidistant(aperture: Aperture) -> Self {
        Self::new(aperture, Projection::Equidistant)
    }
}

/// Geometry settings, constant across a whole batch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FisheyeConfig {
    pub aperture_degrees: f32,
    pub projection: Projection,
}

impl Default for FisheyeConfig {
    fn default() -> Self {
        Self {
            aperture_degrees: 180.0,
            projection: Projection::Equidistant,
        }
    }
}

impl FisheyeConfig {
    pub fn aperture(&self) -> FishResult<Aperture> {
        Aperture::from_degrees(self.aperture_degrees)
    }

    pub fn params(&self) -> FishResult<RemapParams> {
        Ok(RemapParams::new(self.aperture()?, self.projection))
    }
}

/// Number of threads the CPU kernels should use by default
pub fn default_kernel_threads() -> usize {
    num_cpus::get().max(1)
}

/// Installs the global rayon pool the CPU kernels run on. Succeeds at most once per process.
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("equ2fish-kernel-{i}"))
        .build_global()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_aperture_rejects_non_positive() {
        assert!(matches!(Aperture::from_radians(0.0), Err(FishError::InvalidAperture { .. })));
        assert!(matches!(Aperture::from_degrees(-10.0), Err(FishError::InvalidAperture { .. })));
        assert!(matches!(Aperture::from_radians(f32::NAN), Err(FishError::InvalidAperture { .. })));
    }

    #[test]
    fn test_aperture_upper_bound() {
        assert!(Aperture::from_degrees(360.0).is_ok());
        assert!(Aperture::from_radians(TAU).is_ok());
        assert!(matches!(Aperture::from_degrees(361.0), Err(FishError::InvalidAperture { .. })));
        assert!(Aperture::from_degrees(360.0).unwrap().radians() <= TAU);
    }

    #[test]
    fn test_parse_degrees() {
        assert!((Aperture::parse_degrees(" 190 ").unwrap().degrees() - 190.0).abs() < 1e-3);
        assert!(matches!(Aperture::parse_degrees("wide"), Err(FishError::InvalidAperture { .. })));
        assert!(matches!(Aperture::parse_degrees("0"), Err(FishError::InvalidAperture { .. })));
    }

    #[test]
    fn test_degree_conversion() {
        let a = Aperture::from_degrees(180.0).unwrap();
        assert!((a.radians() - PI).abs() < 1e-6);
        assert_eq!(a.to_string(), "180.0°");
    }

    #[test]
    fn test_projection_endpoints() {
        let a = Aperture::from_degrees(190.0).unwrap();
        for p in [Projection::Equidistant, Projection::Equisolid] {
            assert_eq!(p.polar_angle(0.0, a), 0.0);
            assert!((p.polar_angle(1.0, a) - a.radians() / 2.0).abs() < 1e-5, "{p}");
        }
    }

    #[test]
    fn test_projection_parse() {
        assert_eq!("Equisolid".parse::<Projection>().unwrap(), Projection::Equisolid);
        assert_eq!(" equidistant ".parse::<Projection>().unwrap(), Projection::Equidistant);
        assert!(matches!("mercator".parse::<Projection>(), Err(FishError::Configuration(_))));
    }

    #[test]
    fn test_default_config() {
        let cfg = FisheyeConfig::default();
        let params = cfg.params().unwrap();
        assert_eq!(params.projection, Projection::Equidistant);
        assert!((params.aperture.radians() - PI).abs() < 1e-6);

        let bad = FisheyeConfig { aperture_degrees: 0.0, ..cfg };
        assert!(matches!(bad.params(), Err(FishError::InvalidAperture { .. })));
    }
}
