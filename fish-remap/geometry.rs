use fish_core::RemapParams;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Pixel value written outside the fisheye circle
pub const BACKGROUND: [u8; 4] = [0, 0, 0, 0];

/// A direction on the sphere, in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalSample {
    /// In [-π, π)
    pub longitude: f32,
    /// π/2 at the optical axis
    pub latitude: f32,
}

/// Centred coordinates of destination pixel (u, v), scaled so the inscribed
/// circle of radius min(width, height) / 2 has radius 1.
#[inline]
pub fn normalized_coords(u: u32, v: u32, width: u32, height: u32) -> (f32, f32) {
    let radius = width.min(height) as f32 * 0.5;
    (
        (u as f32 - width as f32 * 0.5) / radius,
        (v as f32 - height as f32 * 0.5) / radius,
    )
}

/// Wraps an angle into [-π, π)
#[inline]
pub fn wrap_longitude(theta: f32) -> f32 {
    let wrapped = theta - TAU * ((theta + PI) / TAU).floor();
    // f32 rounding can land one ulp outside on either side
    if wrapped >= PI {
        wrapped - TAU
    } else if wrapped < -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Sphere direction seen by the normalised fisheye point (x, y), or `None`
/// outside the unit circle.
#[inline]
pub fn fisheye_direction(x: f32, y: f32, params: &RemapParams) -> Option<SphericalSample> {
    let r = (x * x + y * y).sqrt();
    if r > 1.0 {
        return None;
    }

    let theta = if r == 0.0 { 0.0 } else { y.atan2(x) };
    let phi = params.projection.polar_angle(r, params.aperture);

    Some(SphericalSample {
        longitude: wrap_longitude(theta),
        latitude: FRAC_PI_2 - phi,
    })
}

/// Linear equirectangular unprojection to fractional source pixel coordinates
#[inline]
pub fn equirect_coords(sample: SphericalSample, src_width: u32, src_height: u32) -> (f32, f32) {
    let sx = (sample.longitude + PI) / TAU * src_width as f32;
    let sy = (FRAC_PI_2 - sample.latitude) / PI * src_height as f32;
    (sx, sy)
}

/// Full destination-to-source mapping for one pixel of the fisheye grid
#[inline]
pub fn source_coords(
    u: u32,
    v: u32,
    dst_dims: (u32, u32),
    src_dims: (u32, u32),
    params: &RemapParams,
) -> Option<(f32, f32)> {
    let (x, y) = normalized_coords(u, v, dst_dims.0, dst_dims.1);
    fisheye_direction(x, y, params).map(|s| equirect_coords(s, src_dims.0, src_dims.1))
}
