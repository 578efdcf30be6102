use fish_core::{Aperture, Projection, RemapParams};
use fish_remap::geometry::{fisheye_direction, source_coords, wrap_longitude};
use fish_remap::sampling::bilinear_sample;
use image::{Rgba, RgbaImage};
use proptest::prelude::*;
use std::f32::consts::{PI, TAU};

fn projection() -> impl Strategy<Value = Projection> {
    prop_oneof![Just(Projection::Equidistant), Just(Projection::Equisolid)]
}

fn checker(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x * 37 % 256) as u8, (y * 53 % 256) as u8, ((x ^ y) % 256) as u8, 255])
    })
}

proptest! {
    #[test]
    fn polar_angle_is_monotonic(
        degrees in 1.0f32..360.0,
        r1 in 0.0f32..1.0,
        r2 in 0.0f32..1.0,
        proj in projection(),
    ) {
        let a = Aperture::from_degrees(degrees).unwrap();
        let (lo, hi) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
        prop_assert!(proj.polar_angle(lo, a) <= proj.polar_angle(hi, a) + 1e-6);
        if hi - lo > 1e-4 {
            prop_assert!(proj.polar_angle(lo, a) < proj.polar_angle(hi, a));
        }
        prop_assert_eq!(proj.polar_angle(0.0, a), 0.0);
    }

    #[test]
    fn outside_circle_is_background(
        w in 2u32..200,
        h in 2u32..200,
        u in 0u32..200,
        v in 0u32..200,
        degrees in 1.0f32..360.0,
    ) {
        let (u, v) = (u % w, v % h);
        let radius = w.min(h) as f32 * 0.5;
        let dx = u as f32 - w as f32 * 0.5;
        let dy = v as f32 - h as f32 * 0.5;
        let r = (dx * dx + dy * dy).sqrt() / radius;
        prop_assume!((r - 1.0).abs() > 1e-4);

        let params = RemapParams::equidistant(Aperture::from_degrees(degrees).unwrap());
        let mapped = source_coords(u, v, (w, h), (w, h), &params);
        prop_assert_eq!(mapped.is_some(), r < 1.0);
    }

    #[test]
    fn inside_circle_latitude_in_range(
        x in -0.7f32..0.7,
        y in -0.7f32..0.7,
        degrees in 1.0f32..360.0,
        proj in projection(),
    ) {
        let params = RemapParams::new(Aperture::from_degrees(degrees).unwrap(), proj);
        let s = fisheye_direction(x, y, &params).unwrap();
        prop_assert!((-PI..PI).contains(&s.longitude));
        prop_assert!(s.latitude <= PI / 2.0 + 1e-6);
        prop_assert!(s.latitude >= -PI / 2.0 - 1e-5);
    }

    #[test]
    fn longitude_wrap_is_periodic(theta in -20.0f32..20.0) {
        let a = wrap_longitude(theta);
        let b = wrap_longitude(theta + TAU);
        // Differences near the seam are a full turn apart
        let d = (a - b).abs();
        prop_assert!(d < 1e-4 || (d - TAU).abs() < 1e-4, "{} vs {}", a, b);
    }

    #[test]
    fn sampling_ignores_full_turns(
        x in 0.0f32..16.0,
        y in 0.0f32..8.0,
        turns in -3i32..3,
    ) {
        // Quarter-pixel steps keep the shifted coordinate exactly representable
        let x = (x * 4.0).round() / 4.0;
        let img = checker(16, 8);
        let a = bilinear_sample(&img, x, y);
        let b = bilinear_sample(&img, x + (turns * 16) as f32, y);
        prop_assert_eq!(a, b);
    }
}
