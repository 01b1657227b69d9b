// THEORY:
// Dense optical flow by Gunnar Farnebäck's polynomial expansion method, computed
// by OpenCV's `calc_optical_flow_farneback`.
//
// Every pixel neighbourhood of both frames is approximated by a quadratic
// polynomial. If the second frame is the first one shifted by `d`, the change in
// the polynomial's linear term gives `d`. The estimate is refined iteratively
// over a window and run coarse-to-fine over an image pyramid, so large motions
// are first found at low resolution.
//
// This module only owns the boundary: it validates the frames, moves them into
// single-channel `Mat`s, and copies the two-channel float result back into a
// `FlowField`. No OpenCV type escapes it.

use image::GrayImage;
use opencv::core::{self, Mat, Point2f, Scalar};
use opencv::prelude::*;
use opencv::video;

use crate::core_modules::grid::{FlowField, FlowVector, Grid};
use crate::error::{MotionError, ensure_same_dimensions};

/// Parameters of the pyramidal Farnebäck estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct FarnebackParams {
    /// Scale between consecutive pyramid levels (0.5 halves the size).
    pub pyr_scale: f64,
    /// Number of pyramid levels above the full-resolution one.
    pub levels: i32,
    /// Side of the averaging window, in pixels.
    pub win_size: i32,
    /// Solver iterations per pyramid level.
    pub iterations: i32,
    /// Radius of the polynomial expansion neighbourhood.
    pub poly_n: i32,
    /// Standard deviation of the polynomial expansion applicability.
    pub poly_sigma: f64,
}

impl Default for FarnebackParams {
    fn default() -> Self {
        Self {
            pyr_scale: 0.5,
            levels: 3,
            win_size: 15,
            iterations: 3,
            poly_n: 5,
            poly_sigma: 1.2,
        }
    }
}

/// Computes the dense flow field that carries `previous` onto `current`.
///
/// Both frames must have the same, non-zero size; the result has that size too.
pub fn dense_flow(
    previous: &GrayImage,
    current: &GrayImage,
    params: &FarnebackParams,
) -> Result<FlowField, MotionError> {
    ensure_same_dimensions(previous.dimensions(), current.dimensions())?;
    let (width, height) = previous.dimensions();
    if width == 0 || height == 0 {
        return Err(MotionError::EmptyFrame { width, height });
    }

    let previous = grey_to_mat(previous)?;
    let current = grey_to_mat(current)?;
    let mut flow = Mat::default();
    video::calc_optical_flow_farneback(
        &previous,
        &current,
        &mut flow,
        params.pyr_scale,
        params.levels,
        params.win_size,
        params.iterations,
        params.poly_n,
        params.poly_sigma,
        0,
    )?;
    log::trace!("dense flow over {width}x{height}");

    let mut field = Grid::filled(width, height, FlowVector::ZERO);
    for y in 0..height {
        for x in 0..width {
            let motion: &Point2f = flow.at_2d(y as i32, x as i32)?;
            field[(x, y)] = FlowVector::new(motion.x, motion.y);
        }
    }
    Ok(field)
}

fn grey_to_mat(image: &GrayImage) -> Result<Mat, MotionError> {
    let (Ok(cols), Ok(rows)) = (i32::try_from(image.width()), i32::try_from(image.height())) else {
        return Err(MotionError::EmptyFrame {
            width: image.width(),
            height: image.height(),
        });
    };
    let mut mat = Mat::new_rows_cols_with_default(rows, cols, core::CV_8UC1, Scalar::all(0.0))?;
    mat.data_bytes_mut()?.copy_from_slice(image.as_raw());
    Ok(mat)
}
