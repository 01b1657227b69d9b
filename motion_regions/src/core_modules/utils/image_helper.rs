use image::{GrayImage, Luma, RgbImage};

use crate::error::MotionError;

/// Greyscale as the truncated mean of the three channels.
///
/// This is an unweighted average, not a luma conversion, so that the detector
/// sees every channel equally regardless of the camera's channel order.
pub fn to_grey(frame: &RgbImage) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let [r, g, b] = frame.get_pixel(x, y).0;
        Luma([((r as u16 + g as u16 + b as u16) / 3) as u8])
    })
}

/// Wraps a tightly packed 3-channel buffer as an `RgbImage`.
pub fn rgb_from_raw(width: u32, height: u32, buffer: Vec<u8>) -> Result<RgbImage, MotionError> {
    let expected = width as usize * height as usize * 3;
    let actual = buffer.len();
    if actual != expected {
        return Err(MotionError::BufferSize { expected, actual });
    }
    RgbImage::from_raw(width, height, buffer).ok_or(MotionError::BufferSize { expected, actual })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn grey_is_the_truncated_channel_mean() {
        let mut frame = RgbImage::new(3, 1);
        frame.put_pixel(0, 0, Rgb([255, 255, 255]));
        frame.put_pixel(1, 0, Rgb([10, 20, 31]));
        frame.put_pixel(2, 0, Rgb([0, 0, 2]));
        let grey = to_grey(&frame);
        assert_eq!(grey.as_raw(), &vec![255, 20, 0]);
    }

    #[test]
    fn grey_ignores_channel_order() {
        let a = RgbImage::from_pixel(2, 2, Rgb([200, 10, 40]));
        let b = RgbImage::from_pixel(2, 2, Rgb([40, 10, 200]));
        assert_eq!(to_grey(&a), to_grey(&b));
    }

    #[test]
    fn raw_buffer_must_match_the_frame_size() {
        let frame = rgb_from_raw(4, 2, vec![7; 24]).expect("exact size");
        assert_eq!(frame.dimensions(), (4, 2));
        assert_eq!(frame.get_pixel(3, 1), &Rgb([7, 7, 7]));

        let err = rgb_from_raw(4, 2, vec![0; 23]).unwrap_err();
        assert_eq!(
            err,
            MotionError::BufferSize {
                expected: 24,
                actual: 23
            }
        );
        assert!(rgb_from_raw(4, 2, vec![0; 32]).is_err());
    }
}
