// THEORY:
// A `Region` is a blob from the dilated mask that survived the size filter,
// together with what the detector reports about it: its rotated bounding box
// and the mean flow inside it.
//
// The size filter runs on the box, not on the blob's pixel count: a region is
// kept only when the shorter side of its minimum-area rectangle reaches the
// minimum. Thin streaks and small specks are dropped no matter how strongly they
// move.
//
// The motion vector averages the flow over the *filled* contour, so pixels that
// fall inside the box but outside the blob never contribute. When the fill has
// no pixels at all the mean is undefined; the region then carries a zero vector
// with `samples == 0` instead of NaNs.

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::core_modules::contour::{Contour, external_contours};
use crate::core_modules::grid::FlowField;
use crate::core_modules::motion_mask::MotionMask;
use crate::core_modules::rotated_rect::RotatedRect;
use crate::error::{MotionError, ensure_same_dimensions};

const INSIDE: Luma<u8> = Luma([255]);

/// Mean displacement over a region's interior.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionVector {
    pub dx: f32,
    pub dy: f32,
    /// Number of pixels the mean was taken over. Zero means no data.
    pub samples: usize,
}

impl MotionVector {
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub contour: Contour,
    pub bounds: RotatedRect,
    pub motion: MotionVector,
}

/// Extracts the regions of `mask` whose bounding box has a shorter side of at
/// least `min_side`, measuring each one's mean flow in `flow`.
pub fn extract_regions(
    mask: &MotionMask,
    flow: &FlowField,
    min_side: f32,
) -> Result<Vec<Region>, MotionError> {
    ensure_same_dimensions(mask.dimensions(), flow.dimensions())?;
    let (width, height) = mask.dimensions();

    let mut regions = Vec::new();
    for contour in external_contours(mask) {
        let Some(bounds) = RotatedRect::enclosing_pixels(&contour.points) else {
            continue;
        };
        if bounds.min_side() < min_side {
            log::trace!(
                "dropping blob with box {:.1}x{:.1}",
                bounds.size.width,
                bounds.size.height
            );
            continue;
        }

        let interior = interior_mask(&contour, width, height);
        let motion = mean_flow_within(flow, &interior, &contour);
        if motion.is_empty() {
            log::debug!(
                "region at ({:.1}, {:.1}) has no interior samples, using zero motion",
                bounds.center.x,
                bounds.center.y
            );
        }
        regions.push(Region {
            contour,
            bounds,
            motion,
        });
    }
    Ok(regions)
}

/// Rasterizes the closed contour polygon, boundary included.
fn interior_mask(contour: &Contour, width: u32, height: u32) -> GrayImage {
    let mut canvas = GrayImage::new(width, height);
    let mut polygon: Vec<Point<i32>> = contour.points.iter().map(|p| Point::new(p.x, p.y)).collect();
    polygon.dedup();
    if polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    match polygon.as_slice() {
        [] => {}
        [p] => {
            if let Some(px) = canvas.get_pixel_mut_checked(p.x as u32, p.y as u32) {
                *px = INSIDE;
            }
        }
        [a, b] => draw_line_segment_mut(
            &mut canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            INSIDE,
        ),
        _ => draw_polygon_mut(&mut canvas, &polygon, INSIDE),
    }
    canvas
}

/// Mean flow over the set pixels of `interior`. Only the contour's bounding
/// box is scanned.
fn mean_flow_within(flow: &FlowField, interior: &GrayImage, contour: &Contour) -> MotionVector {
    let Some((lo, hi)) = contour.bounds() else {
        return MotionVector::default();
    };
    let clamp_x = |v: i32| v.clamp(0, flow.width() as i32 - 1) as u32;
    let clamp_y = |v: i32| v.clamp(0, flow.height() as i32 - 1) as u32;

    let (mut sum_dx, mut sum_dy, mut samples) = (0.0f64, 0.0f64, 0usize);
    for y in clamp_y(lo.y)..=clamp_y(hi.y) {
        for x in clamp_x(lo.x)..=clamp_x(hi.x) {
            if interior.get_pixel(x, y).0[0] == 0 {
                continue;
            }
            let Some(v) = flow.get(x, y) else {
                continue;
            };
            sum_dx += v.dx as f64;
            sum_dy += v.dy as f64;
            samples += 1;
        }
    }

    if samples == 0 {
        return MotionVector::default();
    }
    MotionVector {
        dx: (sum_dx / samples as f64) as f32,
        dy: (sum_dy / samples as f64) as f32,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::contour::PixelPoint;
    use crate::core_modules::grid::{FlowVector, Grid};

    fn block_mask(width: u32, height: u32, x0: u32, y0: u32, w: u32, h: u32) -> MotionMask {
        MotionMask::from_fn(width, height, |x, y| {
            x >= x0 && x < x0 + w && y >= y0 && y < y0 + h
        })
    }

    fn still(width: u32, height: u32) -> FlowField {
        Grid::filled(width, height, FlowVector::ZERO)
    }

    #[test]
    fn size_filter_is_exact_at_the_minimum() {
        for (side, kept) in [(99, 0), (100, 1), (101, 1)] {
            let mask = block_mask(160, 160, 20, 30, side, side);
            let regions = extract_regions(&mask, &still(160, 160), 100.0).expect("same size");
            assert_eq!(regions.len(), kept, "side {side}");
        }
    }

    #[test]
    fn shorter_side_governs_the_filter() {
        let long_and_thin = block_mask(200, 200, 10, 10, 180, 99);
        assert!(extract_regions(&long_and_thin, &still(200, 200), 100.0)
            .expect("same size")
            .is_empty());

        let wide = block_mask(200, 200, 10, 10, 180, 101);
        let regions = extract_regions(&wide, &still(200, 200), 100.0).expect("same size");
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bounds.min_side(), 101.0);
    }

    #[test]
    fn mean_covers_exactly_the_interior() {
        let (x0, y0, w, h) = (5, 7, 20, 12);
        let mask = block_mask(40, 30, x0, y0, w, h);
        let flow = Grid::from_fn(40, 30, |x, y| {
            let inside = x >= x0 && x < x0 + w && y >= y0 && y < y0 + h;
            if inside {
                FlowVector::new(3.0, -2.0)
            } else {
                FlowVector::new(x as f32 * 7.0 - 50.0, y as f32 * 3.0 + 11.0)
            }
        });
        let regions = extract_regions(&mask, &flow, 1.0).expect("same size");
        assert_eq!(regions.len(), 1);
        let motion = regions[0].motion;
        assert_eq!((motion.dx, motion.dy), (3.0, -2.0));
        assert_eq!(motion.samples, (w * h) as usize);
    }

    #[test]
    fn blobs_at_the_frame_edge_are_regions() {
        let flow = Grid::filled(300, 300, FlowVector::new(6.0, 6.0));
        for (x0, y0) in [(75, 75), (0, 75), (75, 0), (0, 0), (150, 150)] {
            let mask = block_mask(300, 300, x0, y0, 150, 150);
            let regions = extract_regions(&mask, &flow, 100.0).expect("same size");
            assert_eq!(regions.len(), 1, "blob at ({x0}, {y0})");
            assert_eq!(regions[0].bounds.min_side(), 150.0);
            assert_eq!((regions[0].motion.dx, regions[0].motion.dy), (6.0, 6.0));
            assert_eq!(regions[0].motion.samples, 150 * 150);
        }
    }

    #[test]
    fn full_frame_blob_is_one_region() {
        let mask = MotionMask::from_fn(100, 100, |_, _| true);
        let regions = extract_regions(&mask, &still(100, 100), 100.0).expect("same size");
        assert_eq!(regions.len(), 1);
        let size = regions[0].bounds.size;
        assert_eq!((size.width, size.height), (100.0, 100.0));
    }

    #[test]
    fn empty_mask_has_no_regions() {
        let regions = extract_regions(&MotionMask::new(32, 32), &still(32, 32), 1.0).expect("same size");
        assert!(regions.is_empty());
    }

    #[test]
    fn mismatched_flow_is_rejected() {
        let err = extract_regions(&MotionMask::new(32, 32), &still(16, 32), 1.0).unwrap_err();
        assert!(matches!(err, MotionError::DimensionMismatch { .. }));
    }

    #[test]
    fn degenerate_contours_still_rasterize() {
        let single = Contour {
            points: vec![PixelPoint::new(3, 4)],
        };
        assert_eq!(interior_mask(&single, 8, 8).get_pixel(3, 4).0[0], 255);

        let segment = Contour {
            points: vec![PixelPoint::new(1, 1), PixelPoint::new(5, 1)],
        };
        let canvas = interior_mask(&segment, 8, 8);
        assert!((1..=5).all(|x| canvas.get_pixel(x, 1).0[0] == 255));
    }

    #[test]
    fn empty_interior_gives_zero_motion() {
        let contour = Contour {
            points: vec![PixelPoint::new(2, 2), PixelPoint::new(4, 4)],
        };
        let flow = Grid::filled(8, 8, FlowVector::new(1.0, 1.0));
        let motion = mean_flow_within(&flow, &GrayImage::new(8, 8), &contour);
        assert_eq!(motion, MotionVector::default());
        assert!(motion.is_empty());
    }
}
