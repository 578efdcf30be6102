use fish_core::{FishError, FishResult, Image};
use image::imageops;
use tracing::debug;

/// The two sensor images recovered from one composite frame
#[derive(Debug, Clone, PartialEq)]
pub struct SensorHalves {
    /// Middle half of the frame, written as `<stem>_1`
    pub right: Image,
    /// Outer quarters joined as last quarter then first quarter, written as `<stem>_2`
    pub left: Image,
}

/// Quarter boundaries `(W/4, 3W/4)` of a composite frame
fn strip_bounds(width: u32, height: u32) -> FishResult<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(FishError::DimensionMismatch {
            width,
            height,
            reason: "composite frame is empty",
        });
    }
    if width % 4 != 0 {
        return Err(FishError::DimensionMismatch {
            width,
            height,
            reason: "composite width must be a multiple of 4",
        });
    }
    Ok((width / 4, 3 * width / 4))
}

/// Splits a composite frame into its two sensor images.
///
/// With strips S1 = [0, W/4), D = [W/4, 3W/4) and S2 = [3W/4, W), the right
/// half is D and the left half is S2 followed by S1. Pixels are copied
/// verbatim; both halves are W/2 wide and keep the frame height.
pub fn assemble(frame: &Image) -> FishResult<SensorHalves> {
    let (w, h) = frame.dimensions();
    let (q1, q3) = strip_bounds(w, h)?;

    let right = imageops::crop_imm(frame, q1, 0, q3 - q1, h).to_image();

    let s1 = imageops::crop_imm(frame, 0, 0, q1, h);
    let s2 = imageops::crop_imm(frame, q3, 0, w - q3, h);
    let mut left = Image::new(q1 + (w - q3), h);
    imageops::replace(&mut left, &*s2, 0, 0);
    imageops::replace(&mut left, &*s1, (w - q3) as i64, 0);

    debug!(width = w, height = h, "composite frame split");

    Ok(SensorHalves { right, left })
}

/// Inverse of the left-half stitching: returns `(S2, S1)`.
pub fn split_left(left: &Image) -> FishResult<(Image, Image)> {
    let (w, h) = left.dimensions();
    if w == 0 || w % 2 != 0 || h == 0 {
        return Err(FishError::DimensionMismatch {
            width: w,
            height: h,
            reason: "left half width must be a non-zero even number",
        });
    }
    let half = w / 2;
    let s2 = imageops::crop_imm(left, 0, 0, half, h).to_image();
    let s1 = imageops::crop_imm(left, half, 0, half, h).to_image();
    Ok((s2, s1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Each quarter filled with a distinct colour, x encoded in the green channel
    fn quartered(w: u32, h: u32) -> Image {
        Image::from_fn(w, h, |x, y| {
            let quarter = (x / (w / 4)) as u8;
            Rgba([quarter * 60, x as u8, y as u8, 255])
        })
    }

    #[test]
    fn test_dimensions() {
        let halves = assemble(&quartered(3200, 8)).unwrap();
        assert_eq!(halves.right.dimensions(), (1600, 8));
        assert_eq!(halves.left.dimensions(), (1600, 8));
    }

    #[test]
    fn test_strip_placement() {
        let frame = quartered(16, 2);
        let halves = assemble(&frame).unwrap();

        // Right half is the middle of the frame
        for x in 0..8 {
            assert_eq!(halves.right.get_pixel(x, 1), frame.get_pixel(x + 4, 1));
        }
        // Left half starts with the last quarter, then the first
        for x in 0..4 {
            assert_eq!(halves.left.get_pixel(x, 0), frame.get_pixel(x + 12, 0));
            assert_eq!(halves.left.get_pixel(x + 4, 0), frame.get_pixel(x, 0));
        }
    }

    #[test]
    fn test_split_left_round_trip() {
        let frame = quartered(40, 6);
        let halves = assemble(&frame).unwrap();
        let (s2, s1) = split_left(&halves.left).unwrap();

        assert_eq!(s1, imageops::crop_imm(&frame, 0, 0, 10, 6).to_image());
        assert_eq!(s2, imageops::crop_imm(&frame, 30, 0, 10, 6).to_image());
    }

    #[test]
    fn test_pixels_never_resampled() {
        let frame = quartered(32, 4);
        let halves = assemble(&frame).unwrap();
        let mut seen: Vec<_> = halves.right.pixels().chain(halves.left.pixels()).copied().collect();
        let mut original: Vec<_> = frame.pixels().copied().collect();
        seen.sort_by_key(|p| p.0);
        original.sort_by_key(|p| p.0);
        assert_eq!(seen, original);
    }

    #[test]
    fn test_width_not_divisible_by_four() {
        let err = assemble(&Image::new(30, 4)).unwrap_err();
        assert!(matches!(err, FishError::DimensionMismatch { width: 30, height: 4, .. }));
    }

    #[test]
    fn test_empty_frame() {
        assert!(matches!(assemble(&Image::new(0, 4)), Err(FishError::DimensionMismatch { .. })));
        assert!(matches!(assemble(&Image::new(8, 0)), Err(FishError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_minimal_frame() {
        let frame = Image::from_fn(4, 1, |x, _| Rgba([x as u8, 0, 0, 255]));
        let halves = assemble(&frame).unwrap();
        assert_eq!(halves.right.as_raw(), &[1, 0, 0, 255, 2, 0, 0, 255]);
        assert_eq!(halves.left.as_raw(), &[3, 0, 0, 255, 0, 0, 0, 255]);
    }
}
