// THEORY:
// The camera and the preview window are process-wide OpenCV resources. Both are
// wrapped in owners that release them in `Drop`, so every way out of the capture
// loop (Escape, end of stream, an error bubbling up through `?`) closes the
// device and the window.
//
// This module is also the only place that knows OpenCV frames are BGR `Mat`s.
// Everything it hands out or accepts is an `image::RgbImage`.

use image::RgbImage;
use motion_regions::MotionError;
use motion_regions::core_modules::utils::image_helper::rgb_from_raw;
use opencv::{
    core::{self, Mat, Scalar},
    highgui, imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera {index} could not be opened")]
    Unavailable { index: i32 },
    #[error("frame has unsupported size {width}x{height}")]
    FrameSize { width: i64, height: i64 },
    #[error(transparent)]
    Frame(#[from] MotionError),
    #[error("opencv: {0}")]
    OpenCv(#[from] opencv::Error),
}

/// An open capture device, released on drop.
pub struct CameraSession {
    capture: VideoCapture,
    index: i32,
    buffer: Mat,
}

impl CameraSession {
    pub fn open(index: i32) -> Result<Self, CaptureError> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(CaptureError::Unavailable { index });
        }
        log::info!("camera {index} opened");
        Ok(Self {
            capture,
            index,
            buffer: Mat::default(),
        })
    }

    /// Reads the next frame. `Ok(None)` means the stream has ended.
    pub fn next_frame(&mut self) -> Result<Option<RgbImage>, CaptureError> {
        if !self.capture.read(&mut self.buffer)? || self.buffer.empty() {
            return Ok(None);
        }
        bgr_mat_to_rgb(&self.buffer).map(Some)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(()) => log::info!("camera {} released", self.index),
            Err(e) => log::warn!("failed to release camera {}: {e}", self.index),
        }
    }
}

/// A named highgui window, destroyed on drop.
pub struct PreviewWindow {
    name: String,
    shown: bool,
}

impl PreviewWindow {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            shown: false,
        }
    }

    pub fn show(&mut self, frame: &RgbImage) -> Result<(), CaptureError> {
        let mat = rgb_to_bgr_mat(frame)?;
        highgui::imshow(&self.name, &mat)?;
        self.shown = true;
        Ok(())
    }

    /// Waits up to `delay_ms` for a key press and returns its low byte, if any.
    pub fn poll_key(&self, delay_ms: i32) -> Result<Option<u8>, CaptureError> {
        let key = highgui::wait_key(delay_ms)?;
        Ok((key >= 0).then_some((key & 0xFF) as u8))
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        if !self.shown {
            return;
        }
        if let Err(e) = highgui::destroy_window(&self.name) {
            log::warn!("failed to close window {}: {e}", self.name);
        }
    }
}

fn bgr_mat_to_rgb(frame: &Mat) -> Result<RgbImage, CaptureError> {
    let (cols, rows) = (frame.cols(), frame.rows());
    let (Ok(width), Ok(height)) = (u32::try_from(cols), u32::try_from(rows)) else {
        return Err(CaptureError::FrameSize {
            width: cols.into(),
            height: rows.into(),
        });
    };
    let mut rgb = Mat::default();
    imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;
    Ok(rgb_from_raw(width, height, rgb.data_bytes()?.to_vec())?)
}

fn rgb_to_bgr_mat(frame: &RgbImage) -> Result<Mat, CaptureError> {
    let (width, height) = frame.dimensions();
    let (Ok(cols), Ok(rows)) = (i32::try_from(width), i32::try_from(height)) else {
        return Err(CaptureError::FrameSize {
            width: width.into(),
            height: height.into(),
        });
    };
    let mut rgb = Mat::new_size_with_default(core::Size::new(cols, rows), core::CV_8UC3, Scalar::all(0.0))?;
    rgb.data_bytes_mut()?.copy_from_slice(frame.as_raw());
    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;
    Ok(bgr)
}
