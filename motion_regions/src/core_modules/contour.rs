// THEORY:
// Contour extraction turns the dilated `MotionMask` into a list of outlines, one
// per moving blob. Only external borders are kept: the outer boundary of every
// top-level 8-connected blob. Holes inside a blob, and blobs nested inside those
// holes, belong to the enclosing outline.
//
// Border following itself is delegated to `imageproc` (Suzuki-Abe). It runs on
// a copy of the mask with a one-pixel background ring, so a blob touching the
// frame edge (or filling the whole frame) still has an outer border; points are
// shifted back into frame coordinates afterwards. The chains list every
// boundary pixel and are simplified here so that straight horizontal, vertical
// and diagonal runs keep only their end points.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};

use crate::core_modules::motion_mask::MotionMask;

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The ordered boundary of one blob, as a closed polygon of pixel positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<PixelPoint>,
}

impl Contour {
    /// Inclusive pixel bounds `(min, max)` of the boundary, or `None` when empty.
    pub fn bounds(&self) -> Option<(PixelPoint, PixelPoint)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (
                PixelPoint::new(lo.x.min(p.x), lo.y.min(p.y)),
                PixelPoint::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }
}

/// Outer borders of all top-level blobs in `mask`, with simplified chains.
pub fn external_contours(mask: &MotionMask) -> Vec<Contour> {
    // Border following only starts on a 0 -> 1 transition, so blobs touching the
    // frame edge need a background ring around the mask.
    let padded = with_background_ring(mask.as_image());
    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| Contour {
            points: simplify_chain(c.points.iter().map(|p| PixelPoint::new(p.x - 1, p.y - 1)).collect()),
        })
        .collect()
}

/// Copies `image` into the center of a canvas one pixel larger on every side.
fn with_background_ring(image: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(image.width() + 2, image.height() + 2);
    for (x, y, pixel) in image.enumerate_pixels() {
        padded.put_pixel(x + 1, y + 1, *pixel);
    }
    padded
}

/// Drops every point that continues the step direction of the point before it.
fn simplify_chain(mut points: Vec<PixelPoint>) -> Vec<PixelPoint> {
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let n = points.len();
    if n <= 2 {
        return points;
    }

    let step = |from: PixelPoint, to: PixelPoint| ((to.x - from.x).signum(), (to.y - from.y).signum());
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rect_mask(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> MotionMask {
        MotionMask::from_fn(width, height, |x, y| {
            rects
                .iter()
                .any(|&(x0, y0, w, h)| x >= x0 && x < x0 + w && y >= y0 && y < y0 + h)
        })
    }

    fn corner_set(contour: &Contour) -> HashSet<(i32, i32)> {
        contour.points.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn rectangle_simplifies_to_its_corners() {
        let mask = rect_mask(20, 12, &[(2, 3, 10, 5)]);
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let expected: HashSet<_> = [(2, 3), (11, 3), (11, 7), (2, 7)].into_iter().collect();
        assert_eq!(corner_set(&contours[0]), expected);
        assert_eq!(contours[0].points.len(), 4);
    }

    #[test]
    fn separate_blobs_get_separate_contours() {
        let mask = rect_mask(40, 20, &[(1, 1, 5, 5), (20, 8, 7, 9)]);
        assert_eq!(external_contours(&mask).len(), 2);
    }

    #[test]
    fn holes_and_nested_blobs_are_not_reported() {
        // A ring with a blob sitting inside its hole.
        let mask = MotionMask::from_fn(30, 30, |x, y| {
            let ring = (2..28).contains(&x) && (2..28).contains(&y) && !((6..24).contains(&x) && (6..24).contains(&y));
            let inner = (12..18).contains(&x) && (12..18).contains(&y);
            ring || inner
        });
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let (lo, hi) = contours[0].bounds().expect("non-empty");
        assert_eq!((lo, hi), (PixelPoint::new(2, 2), PixelPoint::new(27, 27)));
    }

    #[test]
    fn blobs_touching_the_frame_edge_are_traced() {
        let mask = rect_mask(10, 10, &[(0, 0, 10, 10)]);
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let expected: HashSet<_> = [(0, 0), (9, 0), (9, 9), (0, 9)].into_iter().collect();
        assert_eq!(corner_set(&contours[0]), expected);
    }

    #[test]
    fn blobs_touching_each_edge_are_traced() {
        for rect in [(0, 5, 6, 6), (5, 0, 6, 6), (14, 5, 6, 6), (5, 14, 6, 6), (14, 14, 6, 6)] {
            let mask = rect_mask(20, 20, &[rect]);
            let contours = external_contours(&mask);
            assert_eq!(contours.len(), 1, "blob {rect:?}");
            let (x0, y0, w, h) = (rect.0 as i32, rect.1 as i32, rect.2 as i32, rect.3 as i32);
            let expected = (PixelPoint::new(x0, y0), PixelPoint::new(x0 + w - 1, y0 + h - 1));
            assert_eq!(contours[0].bounds(), Some(expected), "blob {rect:?}");
        }
    }

    #[test]
    fn empty_mask_has_no_contours() {
        assert!(external_contours(&MotionMask::new(16, 16)).is_empty());
    }

    #[test]
    fn simplify_keeps_diagonal_end_points() {
        let chain = vec![
            PixelPoint::new(0, 0),
            PixelPoint::new(1, 1),
            PixelPoint::new(2, 2),
            PixelPoint::new(1, 2),
            PixelPoint::new(0, 2),
            PixelPoint::new(0, 1),
        ];
        assert_eq!(
            simplify_chain(chain),
            vec![PixelPoint::new(0, 0), PixelPoint::new(2, 2), PixelPoint::new(0, 2)]
        );
    }
}
