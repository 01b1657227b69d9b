// THEORY:
// The `pipeline` module is the top-level API of the detector. It chains the core
// modules into the per-frame routine:
//
//   previous grey + current grey
//     -> dense optical flow
//     -> magnitude threshold
//     -> dilation
//     -> external contours
//     -> size filter + mean motion per region
//     -> overlay on a copy of the current color frame
//
// `detect_regions` and `render_regions` are the stateless halves. The
// `MotionPipeline` owns the single piece of state that crosses frames, the
// previous greyscale frame. The first frame only fills that slot and yields no
// analysis. The slot is replaced only after a frame was analyzed successfully,
// so a rejected frame never becomes the reference for the next one.

use image::{GrayImage, RgbImage};

use crate::core_modules::motion_mask::MotionMask;
use crate::core_modules::optical_flow::{FarnebackParams, dense_flow};
use crate::core_modules::region::{Region, extract_regions};
use crate::core_modules::utils::image_helper::to_grey;
use crate::error::MotionError;

// Re-export key data structures for the public API.
pub use crate::core_modules::region::MotionVector;
pub use crate::core_modules::render::{RenderStyle, render_regions};
pub use crate::core_modules::rotated_rect::{Point2, RotatedRect, Size2};

/// Tunable constants of the detector. `Default` holds the live tool's values.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub flow: FarnebackParams,
    /// Factor applied to each flow component before the magnitude test.
    pub magnitude_scale: f32,
    /// A pixel is moving when `|s·dx| + |s·dy|` is strictly above this.
    pub magnitude_threshold: f32,
    /// Side of the square dilation kernel, in pixels.
    pub dilation_size: u32,
    /// Regions whose bounding box has a shorter side below this are dropped.
    pub min_region_side: f32,
    pub style: RenderStyle,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            flow: FarnebackParams::default(),
            magnitude_scale: 5.0,
            magnitude_threshold: 50.0,
            dilation_size: 15,
            min_region_side: 100.0,
            style: RenderStyle::default(),
        }
    }
}

/// The result of analyzing one frame against its predecessor.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub regions: Vec<Region>,
    /// The current color frame with every region drawn on it.
    pub rendered: RgbImage,
}

/// Finds the moving regions between two greyscale frames of equal size.
pub fn detect_regions(
    previous: &GrayImage,
    current: &GrayImage,
    config: &DetectorConfig,
) -> Result<Vec<Region>, MotionError> {
    let flow = dense_flow(previous, current, &config.flow)?;
    let active = MotionMask::from_flow(&flow, config.magnitude_scale, config.magnitude_threshold);
    let dilated = active.dilate(config.dilation_size);
    let regions = extract_regions(&dilated, &flow, config.min_region_side)?;
    log::debug!(
        "{} active pixels, {} after dilation, {} regions",
        active.active_count(),
        dilated.active_count(),
        regions.len()
    );
    Ok(regions)
}

/// Frame-to-frame driver holding the previous greyscale frame.
pub struct MotionPipeline {
    config: DetectorConfig,
    previous_grey: Option<GrayImage>,
    frame_count: u64,
}

impl MotionPipeline {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            previous_grey: None,
            frame_count: 0,
        }
    }

    /// Number of frames handed to `process_frame` so far, rejected ones included.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Analyzes `frame` against the previously processed frame.
    ///
    /// Returns `Ok(None)` for the first frame, which only primes the detector.
    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<Option<FrameAnalysis>, MotionError> {
        self.frame_count += 1;
        let grey = to_grey(frame);

        let Some(previous) = self.previous_grey.as_ref() else {
            log::debug!("frame {} primes the detector", self.frame_count);
            self.previous_grey = Some(grey);
            return Ok(None);
        };

        let regions = detect_regions(previous, &grey, &self.config)?;
        let rendered = render_regions(frame, &regions, &self.config.style);
        self.previous_grey = Some(grey);
        Ok(Some(FrameAnalysis { regions, rendered }))
    }
}
