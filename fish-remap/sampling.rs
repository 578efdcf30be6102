use fish_core::Image;

/// Bilinear interpolation on an equirectangular image.
///
/// Columns wrap around (the longitude seam is cyclic), rows clamp at the poles.
#[inline]
pub fn bilinear_sample(img: &Image, x: f32, y: f32) -> [u8; 4] {
    let (w, h) = img.dimensions();

    let x0 = x.floor();
    let y0 = y.floor();
    let dx = x - x0;
    let dy = y - y0;

    let x0_idx = wrap_index(x0 as i64, w);
    let x1_idx = wrap_index(x0 as i64 + 1, w);
    let y0_idx = clamp_index(y0 as i64, h);
    let y1_idx = clamp_index(y0 as i64 + 1, h);

    let p00 = img.get_pixel(x0_idx, y0_idx).0;
    let p10 = img.get_pixel(x1_idx, y0_idx).0;
    let p01 = img.get_pixel(x0_idx, y1_idx).0;
    let p11 = img.get_pixel(x1_idx, y1_idx).0;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f32 * (1.0 - dx) + p10[c] as f32 * dx;
        let bottom = p01[c] as f32 * (1.0 - dx) + p11[c] as f32 * dx;
        out[c] = (top * (1.0 - dy) + bottom * dy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[inline]
fn wrap_index(i: i64, len: u32) -> u32 {
    i.rem_euclid(len as i64) as u32
}

#[inline]
fn clamp_index(i: i64, len: u32) -> u32 {
    i.clamp(0, len as i64 - 1) as u32
}
