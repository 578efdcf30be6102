use fish_core::Image;

/// Rotates `img` by 90° clockwise about its centre, keeping the canvas size.
///
/// This is the fixed orientation correction applied after projection. For
/// non-square canvases the parts that rotate out of frame are dropped and the
/// uncovered area is left transparent; the fisheye circle always survives
/// because it is inscribed around the centre.
pub fn rotate_clockwise_about_center(img: &Image) -> Image {
    let (w, h) = img.dimensions();
    let mut out = Image::new(w, h);
    let (wi, hi) = (w as i64, h as i64);

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        // Doubled coordinates keep pixel centres integral for odd sizes
        let sx = (2 * y as i64 + 1 + wi - hi).div_euclid(2);
        let sy = (wi + hi - 2 * x as i64 - 1).div_euclid(2);
        if (0..wi).contains(&sx) && (0..hi).contains(&sy) {
            *pixel = *img.get_pixel(sx as u32, sy as u32);
        }
    }

    out
}
