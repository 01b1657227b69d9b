use thiserror::Error;

/// Errors surfaced by the motion region detector.
///
/// A region whose interior holds no flow samples is not an error: it is
/// absorbed by `region::mean_flow_within`, which reports a zero vector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MotionError {
    /// Two grids that must correspond pixel for pixel have different sizes.
    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// A frame with zero width or height was handed to the detector.
    #[error("frame has zero area ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    /// A raw pixel buffer does not hold exactly `width * height` pixels.
    #[error("buffer holds {actual} bytes, expected {expected} for the frame size")]
    BufferSize { expected: usize, actual: usize },
    /// The OpenCV optical flow call failed.
    #[error("opencv: {0}")]
    OpenCv(String),
}

impl From<opencv::Error> for MotionError {
    fn from(err: opencv::Error) -> Self {
        MotionError::OpenCv(err.to_string())
    }
}

/// Checks that two grids share the same `(width, height)`.
pub(crate) fn ensure_same_dimensions(
    expected: (u32, u32),
    actual: (u32, u32),
) -> Result<(), MotionError> {
    if expected != actual {
        return Err(MotionError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
