// THEORY:
// The `MotionMask` is the binary "is this pixel moving?" map that sits between
// the dense flow field and the region extraction. It is built in two steps:
//
// 1.  **Magnitude Threshold**: a pixel is active when its scaled L1 flow
//     magnitude `|s·dx| + |s·dy|` exceeds the threshold. Raw flow is noisy at
//     the single-pixel level, so this alone yields speckled, fragmented blobs.
// 2.  **Dilation**: growing every active pixel by a square structuring element
//     merges nearby fragments into coherent blobs and closes small gaps, at the
//     cost of spatial precision.
//
// The mask is stored as a 0/255 `GrayImage` so that `imageproc`'s morphology
// and contour tracing can operate on it directly, but its public surface is
// purely boolean.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;

use crate::core_modules::grid::FlowField;

const ACTIVE: Luma<u8> = Luma([255]);

/// A binary per-pixel motion map.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionMask {
    pixels: GrayImage,
}

impl MotionMask {
    /// An all-inactive mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::new(width, height),
        }
    }

    /// Builds a mask from a predicate over pixel coordinates.
    pub fn from_fn(width: u32, height: u32, mut active: impl FnMut(u32, u32) -> bool) -> Self {
        Self {
            pixels: GrayImage::from_fn(width, height, |x, y| {
                if active(x, y) { ACTIVE } else { Luma([0]) }
            }),
        }
    }

    /// Marks pixels whose scaled L1 flow magnitude is strictly above `threshold`.
    pub fn from_flow(flow: &FlowField, scale: f32, threshold: f32) -> Self {
        let mut mask = Self::new(flow.width(), flow.height());
        for (x, y, motion) in flow.iter() {
            if motion.scaled_l1(scale) > threshold {
                mask.set_active(x, y, true);
            }
        }
        mask
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Whether `(x, y)` is active. Coordinates outside the mask are inactive.
    pub fn is_active(&self, x: u32, y: u32) -> bool {
        self.pixels
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] > 0)
    }

    pub fn set_active(&mut self, x: u32, y: u32, active: bool) {
        if let Some(p) = self.pixels.get_pixel_mut_checked(x, y) {
            *p = if active { ACTIVE } else { Luma([0]) };
        }
    }

    pub fn active_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p.0[0] > 0).count()
    }

    /// Grows active areas by a `size`x`size` square centered on each pixel.
    ///
    /// Even sizes round up to the next odd size. Pixels outside the mask never
    /// contribute.
    pub fn dilate(&self, size: u32) -> Self {
        let radius = u8::try_from(size / 2).unwrap_or(u8::MAX);
        if radius == 0 {
            return self.clone();
        }
        Self {
            pixels: imageproc::morphology::dilate(&self.pixels, Norm::LInf, radius),
        }
    }

    /// The underlying 0/255 image.
    pub fn as_image(&self) -> &GrayImage {
        &self.pixels
    }
}
